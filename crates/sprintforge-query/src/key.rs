//! Cache keys

use sprintforge_model::{BaselineId, ProjectId};

/// Identity of a cached API response
///
/// Every request parameter is part of the key, so responses for different
/// parameters never share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// One page of a project's baselines
    BaselineList {
        /// Project
        project: ProjectId,
        /// Page number
        page: u32,
        /// Page size
        limit: u32,
    },
    /// A baseline with its snapshot
    BaselineDetail {
        /// Project
        project: ProjectId,
        /// Baseline
        baseline: BaselineId,
    },
    /// Comparison of the current schedule against a baseline
    Comparison {
        /// Project
        project: ProjectId,
        /// Baseline
        baseline: BaselineId,
        /// Whether on-track tasks were requested
        include_unchanged: bool,
    },
}

impl QueryKey {
    /// Project the entry belongs to
    #[inline]
    #[must_use]
    pub fn project(&self) -> ProjectId {
        match self {
            Self::BaselineList { project, .. }
            | Self::BaselineDetail { project, .. }
            | Self::Comparison { project, .. } => *project,
        }
    }

    /// Baseline the entry is about, if any
    #[inline]
    #[must_use]
    pub fn baseline(&self) -> Option<BaselineId> {
        match self {
            Self::BaselineList { .. } => None,
            Self::BaselineDetail { baseline, .. } | Self::Comparison { baseline, .. } => {
                Some(*baseline)
            }
        }
    }

    /// Check if this is one of the project's baseline list pages
    #[inline]
    #[must_use]
    pub fn is_list_of(&self, project: ProjectId) -> bool {
        matches!(self, Self::BaselineList { project: p, .. } if *p == project)
    }
}
