//! Comparison payloads
//!
//! A [`BaselineComparison`] is a read-only projection of the current schedule
//! against one baseline. It is replaced wholesale on every fetch and never
//! edited in place.

use crate::types::{BaselineId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a task's schedule variance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Finishing earlier than the baseline
    Ahead,
    /// Finishing later than the baseline
    Behind,
    /// No change against the baseline
    OnTrack,
}

impl VarianceStatus {
    /// Sign-consistent classification of a day offset
    ///
    /// NaN is neither ahead nor behind and classifies as on track.
    #[inline]
    #[must_use]
    pub fn from_days(variance_days: f64) -> Self {
        if variance_days < 0.0 {
            Self::Ahead
        } else if variance_days > 0.0 {
            Self::Behind
        } else {
            Self::OnTrack
        }
    }

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ahead => "ahead",
            Self::Behind => "behind",
            Self::OnTrack => "on_track",
        }
    }
}

impl std::fmt::Display for VarianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-task variance against a baseline
///
/// The status is never stored: it is derived from `variance_days` on every
/// read, so the two cannot disagree. A status sent by the API is checked
/// against the sign and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskVarianceWire", into = "TaskVarianceWire")]
pub struct TaskVariance {
    /// Task identifier
    pub task_id: TaskId,
    /// Task name
    pub task_name: String,
    /// Signed offset in days; negative is ahead, positive is behind
    pub variance_days: f64,
    /// Offset relative to the planned duration, when known
    pub variance_percentage: Option<f64>,
    /// Task status changed since the baseline
    pub status_changed: bool,
    /// Task dependencies changed since the baseline
    pub dependencies_changed: bool,
}

impl TaskVariance {
    /// New record with no change flags set
    #[must_use]
    pub fn new(task_id: TaskId, task_name: impl Into<String>, variance_days: f64) -> Self {
        Self {
            task_id,
            task_name: task_name.into(),
            variance_days,
            variance_percentage: None,
            status_changed: false,
            dependencies_changed: false,
        }
    }

    /// Derived variance status
    #[inline]
    #[must_use]
    pub fn status(&self) -> VarianceStatus {
        VarianceStatus::from_days(self.variance_days)
    }
}

#[derive(Serialize, Deserialize)]
struct TaskVarianceWire {
    task_id: TaskId,
    task_name: String,
    variance_days: f64,
    #[serde(default)]
    variance_percentage: Option<f64>,
    #[serde(default)]
    status: Option<VarianceStatus>,
    #[serde(default)]
    status_changed: bool,
    #[serde(default)]
    dependencies_changed: bool,
}

impl From<TaskVarianceWire> for TaskVariance {
    fn from(wire: TaskVarianceWire) -> Self {
        let derived = VarianceStatus::from_days(wire.variance_days);
        if let Some(sent) = wire.status {
            if sent != derived {
                tracing::warn!(
                    task_id = %wire.task_id,
                    sent = %sent,
                    derived = %derived,
                    "variance status disagrees with sign of variance_days; using derived status"
                );
            }
        }
        Self {
            task_id: wire.task_id,
            task_name: wire.task_name,
            variance_days: wire.variance_days,
            variance_percentage: wire.variance_percentage,
            status_changed: wire.status_changed,
            dependencies_changed: wire.dependencies_changed,
        }
    }
}

impl From<TaskVariance> for TaskVarianceWire {
    fn from(tv: TaskVariance) -> Self {
        let status = tv.status();
        Self {
            task_id: tv.task_id,
            task_name: tv.task_name,
            variance_days: tv.variance_days,
            variance_percentage: tv.variance_percentage,
            status: Some(status),
            status_changed: tv.status_changed,
            dependencies_changed: tv.dependencies_changed,
        }
    }
}

/// Baseline reference embedded in a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRef {
    /// Baseline identifier
    pub id: BaselineId,
    /// Baseline name
    pub name: String,
    /// Capture time
    pub created_at: DateTime<Utc>,
}

/// Aggregate counts over a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Tasks present in both baseline and current schedule
    #[serde(default)]
    pub total_tasks: u32,
    /// Tasks ahead of the baseline
    #[serde(default)]
    pub tasks_ahead: u32,
    /// Tasks behind the baseline
    #[serde(default)]
    pub tasks_behind: u32,
    /// Tasks matching the baseline
    #[serde(default)]
    pub tasks_on_track: u32,
    /// Mean variance across tasks, in days
    #[serde(default)]
    pub avg_variance_days: f64,
    /// Variance of the critical path finish, in days
    #[serde(default)]
    pub critical_path_variance_days: f64,
}

/// Task added or removed since the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskChange {
    /// Task identifier
    pub task_id: TaskId,
    /// Task name
    pub task_name: String,
}

/// Current schedule compared against one baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    /// Reference baseline
    pub baseline: BaselineRef,
    /// When the comparison was computed
    pub comparison_date: DateTime<Utc>,
    /// Aggregate counts
    #[serde(default)]
    pub summary: ComparisonSummary,
    /// Per-task variance, in API order
    #[serde(default)]
    pub task_variances: Vec<TaskVariance>,
    /// Tasks created after the baseline was captured
    #[serde(default)]
    pub tasks_added: Vec<TaskChange>,
    /// Tasks deleted since the baseline was captured
    #[serde(default)]
    pub tasks_deleted: Vec<TaskChange>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_follows_sign() {
        assert_eq!(VarianceStatus::from_days(-0.5), VarianceStatus::Ahead);
        assert_eq!(VarianceStatus::from_days(2.0), VarianceStatus::Behind);
        assert_eq!(VarianceStatus::from_days(0.0), VarianceStatus::OnTrack);
        assert_eq!(VarianceStatus::from_days(-0.0), VarianceStatus::OnTrack);
        assert_eq!(VarianceStatus::from_days(f64::NAN), VarianceStatus::OnTrack);
    }

    #[test]
    fn wire_status_cannot_override_sign() {
        let json = r#"{
            "task_id": "00000000-0000-0000-0000-0000000000aa",
            "task_name": "Build",
            "variance_days": 3,
            "status": "ahead"
        }"#;
        let tv: TaskVariance = serde_json::from_str(json).unwrap();
        assert_eq!(tv.status(), VarianceStatus::Behind);
        assert!(!tv.status_changed);
    }

    #[test]
    fn serialized_record_carries_derived_status() {
        let tv = TaskVariance::new(TaskId::new(), "Ship", -2.0);
        let json = serde_json::to_value(&tv).unwrap();
        assert_eq!(json["status"], "ahead");
    }

    #[test]
    fn comparison_deserializes_minimal_payload() {
        let json = r#"{
            "baseline": {
                "id": "7f1d3c2a-0b4e-4a55-9b1e-2f7c9d0a1b2c",
                "name": "Kickoff",
                "created_at": "2026-03-01T12:00:00Z"
            },
            "comparison_date": "2026-03-08T12:00:00Z"
        }"#;
        let cmp: BaselineComparison = serde_json::from_str(json).unwrap();
        assert!(cmp.task_variances.is_empty());
        assert_eq!(cmp.summary, ComparisonSummary::default());
    }
}
