//! Unchanged-task filtering

use sprintforge_model::{TaskVariance, VarianceStatus};

/// Check if a row survives the include-unchanged flag
#[inline]
#[must_use]
pub fn is_visible(row: &TaskVariance, include_unchanged: bool) -> bool {
    include_unchanged || row.status() != VarianceStatus::OnTrack
}

/// Rows to show for the given flag
///
/// With `include_unchanged` the input is returned as-is; otherwise every
/// on-track row is dropped. Matches what the API returns for the same
/// `include_unchanged` query parameter.
#[must_use]
pub fn filter_variances(rows: &[TaskVariance], include_unchanged: bool) -> Vec<TaskVariance> {
    rows.iter()
        .filter(|row| is_visible(row, include_unchanged))
        .cloned()
        .collect()
}
