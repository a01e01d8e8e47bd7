//! End-to-end workflows across the list model, lifecycle controller and
//! comparison view model, sharing one cache the way a screen does.
//!
//! Core guarantees exercised here:
//! - Activating a baseline leaves exactly one active baseline in a fresh
//!   list load, and it is the one just activated.
//! - Comparison rows are filtered and ordered from the raw payload on every
//!   read. Only showing on-track rows the payload lacks triggers a fetch.
//! - A blank create never reaches the API and never marks the operation pending.
//! - Deleting a baseline evicts everything cached about it.

use sprintforge_baseline::prelude::*;
use sprintforge_baseline::{AutoConfirm, OperationKey};
use sprintforge_client::BaselineApi;
use sprintforge_model::{ForgeError, ProjectId, VarianceStatus};
use sprintforge_query::{QueryCache, QueryKey};
use sprintforge_test_utils::{comparison_with, FakeBaselineApi};
use std::sync::Arc;

struct Screen {
    api: Arc<FakeBaselineApi>,
    cache: QueryCache,
    list: BaselineListModel,
    lifecycle: BaselineLifecycleController,
    comparison: ComparisonViewModel,
}

fn screen() -> Screen {
    let api = Arc::new(FakeBaselineApi::new());
    let cache = QueryCache::new(100);
    let dyn_api: Arc<dyn BaselineApi> = api.clone();
    Screen {
        list: BaselineListModel::new(Arc::clone(&dyn_api), cache.clone()),
        lifecycle: BaselineLifecycleController::new(
            Arc::clone(&dyn_api),
            cache.clone(),
            Arc::new(AutoConfirm(true)),
        ),
        comparison: ComparisonViewModel::new(dyn_api, cache.clone()),
        api,
        cache,
    }
}

/// Tenet: one active baseline per project, visible right after activation.
///
/// The list page was cached before activation; if the controller failed to
/// invalidate it the stale page would still show the old baseline as active.
#[tokio::test]
async fn activation_leaves_exactly_one_active_baseline() {
    let s = screen();
    let project = ProjectId::new();
    let original = s.api.seed_baseline(project, "Kickoff", true);
    let replan = s.api.seed_baseline(project, "Replan", false);

    let before = s.list.load(project, 1, 20).await.unwrap();
    assert_eq!(before.active().map(|b| b.id), Some(original));

    let response = s.lifecycle.activate(project, replan).await.unwrap();
    assert!(response.is_active);

    let after = s.list.load(project, 1, 20).await.unwrap();
    let active: Vec<_> = after.baselines.iter().filter(|b| b.is_active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, replan);
    assert_eq!(s.list.active().map(|b| b.id), Some(replan));
    assert_eq!(s.api.calls("list"), 2);
}

/// Tenet: variance ordering and unchanged filtering derive from raw data.
#[tokio::test]
async fn variance_scenario_orders_by_magnitude_and_hides_on_track() {
    let s = screen();
    let project = ProjectId::new();
    let baseline = s.api.seed_baseline(project, "Kickoff", true);
    s.api.set_comparison(
        baseline,
        comparison_with(baseline, &[("A", -5.0), ("B", 0.0), ("C", 3.0)]),
    );

    s.comparison.set_include_unchanged(true).await.unwrap();
    let view = s.comparison.load(project, baseline).await.unwrap();
    let shown: Vec<(&str, VarianceStatus)> = view
        .rows
        .iter()
        .map(|r| (r.task.task_name.as_str(), r.display.status))
        .collect();
    assert_eq!(
        shown,
        [
            ("A", VarianceStatus::Ahead),
            ("C", VarianceStatus::Behind),
            ("B", VarianceStatus::OnTrack),
        ]
    );
    assert_eq!(view.rows[0].display.display_text, "5 days ahead");
    assert_eq!(view.rows[1].display.aria_label, "3 days behind of baseline");

    let calls = s.api.calls("compare");
    let hidden = s.comparison.set_include_unchanged(false).await.unwrap();
    let names: Vec<&str> = hidden.rows.iter().map(|r| r.task.task_name.as_str()).collect();
    assert_eq!(names, ["A", "C"]);
    assert_eq!(s.api.calls("compare"), calls);
}

/// Tenet: name ordering is alphabetical and covers on-track rows too.
///
/// The first load uses the default flag, so the payload carries no on-track
/// rows. Showing them has to fetch before the name order can include Alpha.
#[tokio::test]
async fn name_scenario_sorts_alphabetically() {
    let s = screen();
    let project = ProjectId::new();
    let baseline = s.api.seed_baseline(project, "Kickoff", true);
    s.api.set_comparison(
        baseline,
        comparison_with(baseline, &[("Charlie", -5.0), ("Alpha", 0.0), ("Bravo", 3.0)]),
    );
    s.comparison.load(project, baseline).await.unwrap();

    s.comparison.set_include_unchanged(true).await.unwrap();
    let by_name = s.comparison.set_sort_key(SortKey::Name);
    let names: Vec<&str> = by_name.rows.iter().map(|r| r.task.task_name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Bravo", "Charlie"]);
    assert_eq!(s.api.calls("compare"), 2);

    let by_variance = s.comparison.set_sort_key(SortKey::Variance);
    let mut ids: Vec<_> = by_variance.rows.iter().map(|r| r.task.task_id).collect();
    let mut name_ids: Vec<_> = by_name.rows.iter().map(|r| r.task.task_id).collect();
    ids.sort();
    name_ids.sort();
    assert_eq!(ids, name_ids);
    assert_eq!(by_variance.rows[0].task.task_name, "Charlie");
}

/// Tenet: a blank name is rejected before anything is sent.
#[tokio::test]
async fn blank_create_is_rejected_locally() {
    let s = screen();
    let project = ProjectId::new();

    let err = s.lifecycle.create(project, "", None).await.unwrap_err();

    assert!(matches!(err, ForgeError::Validation { .. }));
    assert_eq!(s.api.calls("create"), 0);
    assert!(!s.lifecycle.is_pending(&OperationKey::create(project)));
}

/// Tenet: creating a baseline refreshes the project's list.
#[tokio::test]
async fn create_shows_up_in_next_list_load() {
    let s = screen();
    let project = ProjectId::new();
    assert_eq!(s.list.load(project, 1, 20).await.unwrap().total, 0);

    let created = s
        .lifecycle
        .create(project, "Sprint 3", Some("post-planning".into()))
        .await
        .unwrap();

    let list = s.list.load(project, 1, 20).await.unwrap();
    assert_eq!(list.total, 1);
    assert_eq!(list.baselines[0].id, created.id);
    assert_eq!(list.baselines[0].description.as_deref(), Some("post-planning"));
}

/// Tenet: a deleted baseline leaves nothing cached behind.
#[tokio::test]
async fn delete_evicts_cached_comparison() {
    let s = screen();
    let project = ProjectId::new();
    let baseline = s.api.seed_baseline(project, "Old", false);
    s.api.set_comparison(baseline, comparison_with(baseline, &[("A", 1.0)]));
    s.comparison.load(project, baseline).await.unwrap();
    let key = QueryKey::Comparison {
        project,
        baseline,
        include_unchanged: false,
    };
    assert!(s.cache.contains(&key).await);

    s.lifecycle.delete(project, baseline).await.unwrap();

    assert!(!s.cache.contains(&key).await);
    let err = s.comparison.refetch().await.unwrap_err();
    assert!(matches!(err, ForgeError::NotFound(_)));
}

/// Tenet: a failed refresh keeps the rows on screen and reports the error.
#[tokio::test]
async fn failed_refresh_keeps_previous_rows() {
    let s = screen();
    let project = ProjectId::new();
    let baseline = s.api.seed_baseline(project, "Kickoff", true);
    s.api.set_comparison(baseline, comparison_with(baseline, &[("A", 2.0), ("B", -1.0)]));
    s.comparison.load(project, baseline).await.unwrap();

    s.api.fail_next(ForgeError::Server {
        status: 503,
        message: "maintenance".into(),
    });
    assert!(s.comparison.refetch().await.is_err());

    let view = s.comparison.view();
    assert_eq!(view.rows.len(), 2);
    assert!(!view.loading);
    assert!(matches!(view.error, Some(ForgeError::Server { status: 503, .. })));
}
