//! Comparison row ordering

use serde::{Deserialize, Serialize};
use sprintforge_model::TaskVariance;
use std::cmp::Ordering;
use std::str::FromStr;

/// How the comparison table is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Largest absolute variance first
    #[default]
    Variance,
    /// Task name, A to Z
    Name,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "variance" => Ok(Self::Variance),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown sort key {other:?}, expected variance or name")),
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Variance => "variance",
            Self::Name => "name",
        })
    }
}

/// Sorted copy of `rows`; the input is left untouched
#[must_use]
pub fn sort_variances(rows: &[TaskVariance], key: SortKey) -> Vec<TaskVariance> {
    let mut sorted = rows.to_vec();
    sort_in_place(&mut sorted, key);
    sorted
}

/// Order rows by `key`
///
/// Variance order is descending by magnitude with ties broken by ascending
/// task id. Name order is case-insensitive with ties broken by the exact
/// name, then task id. Both orders are total, so sorting is idempotent.
pub fn sort_in_place(rows: &mut [TaskVariance], key: SortKey) {
    match key {
        SortKey::Variance => rows.sort_by(by_magnitude),
        SortKey::Name => {
            rows.sort_by_cached_key(|row| (row.task_name.to_lowercase(), row.task_name.clone(), row.task_id));
        }
    }
}

fn by_magnitude(a: &TaskVariance, b: &TaskVariance) -> Ordering {
    b.variance_days
        .abs()
        .total_cmp(&a.variance_days.abs())
        .then_with(|| a.task_id.cmp(&b.task_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sprintforge_model::TaskId;
    use uuid::Uuid;

    fn id(n: u128) -> TaskId {
        TaskId(Uuid::from_u128(n))
    }

    fn row(n: u128, name: &str, days: f64) -> TaskVariance {
        TaskVariance::new(id(n), name, days)
    }

    fn names(rows: &[TaskVariance]) -> Vec<&str> {
        rows.iter().map(|r| r.task_name.as_str()).collect()
    }

    #[test]
    fn variance_is_descending_by_magnitude() {
        let input = vec![row(1, "small", 1.0), row(2, "big", -7.0), row(3, "mid", 3.0)];
        let sorted = sort_variances(&input, SortKey::Variance);
        assert_eq!(names(&sorted), ["big", "mid", "small"]);
        assert_eq!(names(&input), ["small", "big", "mid"]);
    }

    #[test]
    fn variance_ties_break_on_task_id() {
        let input = vec![row(9, "late id", 4.0), row(2, "early id", -4.0)];
        let sorted = sort_variances(&input, SortKey::Variance);
        assert_eq!(names(&sorted), ["early id", "late id"]);
    }

    #[test]
    fn name_is_case_insensitive_ascending() {
        let input = vec![
            row(1, "charlie", 0.0),
            row(2, "Alpha", 0.0),
            row(3, "bravo", 0.0),
        ];
        let sorted = sort_variances(&input, SortKey::Name);
        assert_eq!(names(&sorted), ["Alpha", "bravo", "charlie"]);
    }

    #[test]
    fn empty_input() {
        assert!(sort_variances(&[], SortKey::Name).is_empty());
    }

    #[test]
    fn sort_key_parses() {
        assert_eq!("Name".parse::<SortKey>(), Ok(SortKey::Name));
        assert_eq!(" variance ".parse::<SortKey>(), Ok(SortKey::Variance));
        assert!("date".parse::<SortKey>().is_err());
        assert_eq!(SortKey::default(), SortKey::Variance);
    }

    fn arb_rows() -> impl Strategy<Value = Vec<TaskVariance>> {
        prop::collection::vec((0u128..50, "[a-zA-Z]{0,6}", -30i32..30), 0..40).prop_map(|items| {
            items
                .into_iter()
                .map(|(n, name, days)| row(n, &name, f64::from(days) / 2.0))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn variance_sort_is_ordered_permutation(input in arb_rows()) {
            let sorted = sort_variances(&input, SortKey::Variance);
            prop_assert_eq!(sorted.len(), input.len());
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].variance_days.abs() >= pair[1].variance_days.abs());
            }
            for r in &input {
                let want = input.iter().filter(|x| *x == r).count();
                let got = sorted.iter().filter(|x| *x == r).count();
                prop_assert_eq!(want, got);
            }
            prop_assert_eq!(sort_variances(&sorted, SortKey::Variance), sorted);
        }

        #[test]
        fn name_sort_is_ordered_and_idempotent(input in arb_rows()) {
            let sorted = sort_variances(&input, SortKey::Name);
            prop_assert_eq!(sorted.len(), input.len());
            for pair in sorted.windows(2) {
                prop_assert!(pair[0].task_name.to_lowercase() <= pair[1].task_name.to_lowercase());
            }
            prop_assert_eq!(sort_variances(&sorted, SortKey::Name), sorted);
        }
    }
}
