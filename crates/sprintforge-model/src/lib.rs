//! SprintForge Model - baseline and variance data types
//!
//! The typed shapes exchanged with the SprintForge API:
//! - Identifiers for projects, baselines and tasks
//! - Baselines, their snapshots and paged listings
//! - Per-task variance records and comparison payloads
//! - The error taxonomy shared by every client-side component
//!
//! Unknown fields in API payloads are ignored on deserialization; every
//! section the API may omit is modelled as an `Option` or defaulted `Vec`.

pub mod baseline;
pub mod comparison;
pub mod error;
pub mod types;

pub use baseline::{
    ActivateResponse, Baseline, BaselineDetail, BaselineList, BaselineSnapshot,
    CreateBaselineRequest, MAX_BASELINE_NAME_LEN, MAX_SNAPSHOT_BYTES,
};
pub use comparison::{
    BaselineComparison, BaselineRef, ComparisonSummary, TaskChange, TaskVariance, VarianceStatus,
};
pub use error::{ForgeError, Operation};
pub use types::{BaselineId, ProjectId, TaskId};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
