//! Baselines and their snapshots
//!
//! A baseline is an immutable point-in-time capture of a project's schedule.
//! Only the `is_active` flag changes after creation, and at most one baseline
//! per project is active at a time (the API enforces this).

use crate::error::ForgeError;
use crate::types::{BaselineId, ProjectId, TaskId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Longest accepted baseline name, in characters
pub const MAX_BASELINE_NAME_LEN: usize = 255;

/// Size ceiling the API applies to a baseline snapshot (10MB)
pub const MAX_SNAPSHOT_BYTES: u64 = 10 * 1024 * 1024;

/// Baseline metadata as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Baseline identifier
    pub id: BaselineId,
    /// Owning project
    pub project_id: ProjectId,
    /// Display name
    pub name: String,
    /// Optional free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Capture time
    pub created_at: DateTime<Utc>,
    /// Whether this is the project's comparison reference
    #[serde(default)]
    pub is_active: bool,
    /// Serialized snapshot size
    #[serde(default)]
    pub snapshot_size_bytes: u64,
}

/// Baseline including its captured snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineDetail {
    /// Baseline metadata
    #[serde(flatten)]
    pub baseline: Baseline,
    /// Captured project state
    #[serde(default)]
    pub snapshot: BaselineSnapshot,
}

/// Captured project state
///
/// Every section is optional: older baselines may predate simulation
/// results, and extra sections added by the API are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    /// Project header at capture time
    #[serde(default)]
    pub project: Option<SnapshotProject>,
    /// Tasks at capture time
    #[serde(default)]
    pub tasks: Vec<SnapshotTask>,
    /// Task ids on the critical path, in path order
    #[serde(default)]
    pub critical_path: Vec<TaskId>,
    /// Monte Carlo completion estimates
    #[serde(default)]
    pub monte_carlo: Option<SimulationSummary>,
}

/// Project header inside a snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotProject {
    /// Project name
    #[serde(default)]
    pub name: Option<String>,
    /// Project status label
    #[serde(default)]
    pub status: Option<String>,
    /// Planned start
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// Task inside a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotTask {
    /// Task identifier
    pub id: TaskId,
    /// Task name
    pub name: String,
    /// Planned duration
    #[serde(default)]
    pub duration_days: Option<f64>,
    /// Scheduled start
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Scheduled finish
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Task status label
    #[serde(default)]
    pub status: Option<String>,
    /// Predecessor task ids
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

/// Percentile completion estimates from the schedule simulation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    /// Number of simulated runs
    #[serde(default)]
    pub iterations: Option<u32>,
    /// Median completion, in days
    #[serde(default)]
    pub p50_days: Option<f64>,
    /// 80th percentile completion, in days
    #[serde(default)]
    pub p80_days: Option<f64>,
    /// 95th percentile completion, in days
    #[serde(default)]
    pub p95_days: Option<f64>,
}

/// One page of a project's baselines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineList {
    /// Baselines on this page
    pub baselines: Vec<Baseline>,
    /// Total baselines across all pages
    pub total: u64,
    /// One-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
}

impl BaselineList {
    /// The active baseline on this page, if any
    #[must_use]
    pub fn active(&self) -> Option<&Baseline> {
        self.baselines.iter().find(|b| b.is_active)
    }
}

/// Response of the activate endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateResponse {
    /// Activated baseline
    pub id: BaselineId,
    /// New active flag
    pub is_active: bool,
    /// Human-readable confirmation
    #[serde(default)]
    pub message: String,
}

/// Body of the create endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBaselineRequest {
    /// Baseline name
    pub name: String,
    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateBaselineRequest {
    /// Build a request; blank descriptions are dropped
    #[must_use]
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description: description.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Client-side checks that must pass before the request is sent
    ///
    /// # Errors
    /// `ForgeError::Validation` if the name is blank or longer than
    /// [`MAX_BASELINE_NAME_LEN`] characters.
    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::validation("name", "Baseline name is required"));
        }
        if self.name.chars().count() > MAX_BASELINE_NAME_LEN {
            return Err(ForgeError::validation(
                "name",
                format!("Baseline name must be at most {MAX_BASELINE_NAME_LEN} characters"),
            ));
        }
        Ok(())
    }
}
