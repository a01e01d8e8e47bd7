//! Variance classification for display
//!
//! Turns a signed day offset into the status, label and accessible label a
//! variance badge shows. Every finite or non-finite input is accepted.

use serde::Serialize;
use sprintforge_model::VarianceStatus;

/// Presentation of one variance value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VarianceDisplay {
    /// Sign-consistent status
    pub status: VarianceStatus,
    /// Short label, e.g. "5 days ahead"
    pub display_text: String,
    /// Screen-reader label, e.g. "5 days ahead of baseline"
    pub aria_label: String,
}

/// Classify a signed day offset
///
/// Negative is ahead, positive is behind, zero is on track. The magnitude
/// is printed in its shortest form (`5`, `2.5`) and "day" is singular only
/// for a magnitude of exactly one.
#[must_use]
pub fn classify(variance_days: f64) -> VarianceDisplay {
    let status = VarianceStatus::from_days(variance_days);
    let (display_text, aria_label) = match status {
        VarianceStatus::OnTrack => ("On track".to_string(), "On track with baseline".to_string()),
        VarianceStatus::Ahead | VarianceStatus::Behind => {
            let text = format!("{} {}", days(variance_days), direction(status));
            let aria = format!("{text} of baseline");
            (text, aria)
        }
    };
    VarianceDisplay {
        status,
        display_text,
        aria_label,
    }
}

fn direction(status: VarianceStatus) -> &'static str {
    if status == VarianceStatus::Ahead {
        "ahead"
    } else {
        "behind"
    }
}

fn days(variance_days: f64) -> String {
    let magnitude = variance_days.abs();
    #[allow(clippy::float_cmp)]
    let unit = if magnitude == 1.0 { "day" } else { "days" };
    format!("{magnitude} {unit}")
}
