//! Comparison screen state
//!
//! [`ComparisonViewModel`] is the single source of truth for what the
//! comparison screen shows. It keeps the last fetched payload next to two
//! pieces of UI state (sort key, include-unchanged flag) and derives the
//! displayed rows from them on every read. Every state transition publishes
//! a fresh [`ComparisonView`] on a watch channel.

use crate::filter::filter_variances;
use crate::sort::{sort_in_place, SortKey};
use crate::variance::{classify, VarianceDisplay};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use sprintforge_client::BaselineApi;
use sprintforge_model::{
    BaselineComparison, BaselineId, BaselineRef, ComparisonSummary, ForgeError, ProjectId,
    TaskChange, TaskVariance,
};
use sprintforge_query::{QueryCache, QueryKey};
use std::sync::Arc;
use tokio::sync::watch;

/// One displayed comparison row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    /// Variance record
    #[serde(flatten)]
    pub task: TaskVariance,
    /// Badge presentation
    pub display: VarianceDisplay,
}

impl From<TaskVariance> for ComparisonRow {
    fn from(task: TaskVariance) -> Self {
        let display = classify(task.variance_days);
        Self { task, display }
    }
}

/// Snapshot of everything the comparison screen renders
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonView {
    /// Reference baseline of the shown data
    pub baseline: Option<BaselineRef>,
    /// Aggregate counts of the shown data
    pub summary: Option<ComparisonSummary>,
    /// Filtered, sorted, decorated rows
    pub rows: Vec<ComparisonRow>,
    /// Tasks created since the baseline
    pub tasks_added: Vec<TaskChange>,
    /// Tasks removed since the baseline
    pub tasks_deleted: Vec<TaskChange>,
    /// Current sort key
    pub sort_key: SortKey,
    /// Whether on-track rows are shown
    pub include_unchanged: bool,
    /// A fetch is in flight
    pub loading: bool,
    /// Last fetch failure; shown alongside stale rows
    #[serde(serialize_with = "error_message")]
    pub error: Option<ForgeError>,
}

fn error_message<S: Serializer>(error: &Option<ForgeError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Default)]
struct ComparisonState {
    raw: Option<Arc<BaselineComparison>>,
    // Flag the payload in `raw` was fetched with; a `false` payload lacks
    // the on-track rows.
    raw_include_unchanged: bool,
    include_unchanged: bool,
    sort_key: SortKey,
    loading: bool,
    error: Option<ForgeError>,
    params: Option<(ProjectId, BaselineId)>,
    generation: u64,
}

impl ComparisonState {
    fn key(&self) -> Option<QueryKey> {
        self.params.map(|(project, baseline)| QueryKey::Comparison {
            project,
            baseline,
            include_unchanged: self.include_unchanged,
        })
    }
}

/// View model for the baseline comparison screen
pub struct ComparisonViewModel {
    api: Arc<dyn BaselineApi>,
    cache: QueryCache,
    state: Mutex<ComparisonState>,
    publisher: watch::Sender<ComparisonView>,
}

impl std::fmt::Debug for ComparisonViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonViewModel")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl ComparisonViewModel {
    /// Create view model with default UI state (sort by variance, hide unchanged)
    #[must_use]
    pub fn new(api: Arc<dyn BaselineApi>, cache: QueryCache) -> Self {
        let (publisher, _) = watch::channel(ComparisonView::default());
        Self {
            api,
            cache,
            state: Mutex::new(ComparisonState::default()),
            publisher,
        }
    }

    /// Load the comparison for a project baseline
    ///
    /// Served from the cache when fresh. On failure the previous payload for
    /// the same baseline stays visible and the error is recorded. Switching
    /// to a different baseline clears the previous payload first.
    ///
    /// # Errors
    /// The fetch failure, which is also kept in [`Self::error`].
    pub async fn load(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<ComparisonView, ForgeError> {
        self.run(project, baseline, false).await
    }

    /// Re-run the last load, bypassing the cache
    ///
    /// # Errors
    /// `ForgeError::Validation` if nothing was loaded yet, otherwise the
    /// fetch failure.
    pub async fn refetch(&self) -> Result<ComparisonView, ForgeError> {
        let params = self.state.lock().params;
        let (project, baseline) = params.ok_or_else(|| {
            ForgeError::validation("comparison", "nothing loaded to refetch")
        })?;
        self.run(project, baseline, true).await
    }

    async fn run(
        &self,
        project: ProjectId,
        baseline: BaselineId,
        bypass_cache: bool,
    ) -> Result<ComparisonView, ForgeError> {
        let (generation, include_unchanged) = {
            let mut state = self.state.lock();
            if state.params != Some((project, baseline)) {
                state.raw = None;
                state.error = None;
            }
            state.params = Some((project, baseline));
            state.generation += 1;
            state.loading = true;
            (state.generation, state.include_unchanged)
        };
        self.publish();

        let key = QueryKey::Comparison {
            project,
            baseline,
            include_unchanged,
        };
        let api = Arc::clone(&self.api);
        let load = move || async move {
            api.compare_baseline(project, baseline, include_unchanged)
                .await
        };
        let result = if bypass_cache {
            self.cache.refetch(key, load).await
        } else {
            self.cache.fetch(key, load).await
        };

        self.commit(generation, include_unchanged, result)
    }

    fn commit(
        &self,
        generation: u64,
        include_unchanged: bool,
        result: Result<Arc<BaselineComparison>, ForgeError>,
    ) -> Result<ComparisonView, ForgeError> {
        let superseded = {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.loading = false;
                match &result {
                    Ok(comparison) => {
                        state.raw = Some(Arc::clone(comparison));
                        state.raw_include_unchanged = include_unchanged;
                        state.error = None;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "comparison fetch failed; keeping last data");
                        state.error = Some(e.clone());
                    }
                }
                false
            } else {
                tracing::debug!(
                    generation,
                    current = state.generation,
                    "discarding superseded comparison response"
                );
                true
            }
        };
        if superseded {
            return result.map(|_| self.view());
        }
        self.publish();
        result.map(|_| self.view())
    }

    /// Show or hide on-track rows
    ///
    /// Hiding them is a local filter. Showing them fetches the comparison
    /// again with the flag set when the loaded payload was fetched without
    /// it, since such a payload carries no on-track rows.
    ///
    /// # Errors
    /// The fetch failure, which is also kept in [`Self::error`].
    pub async fn set_include_unchanged(
        &self,
        include_unchanged: bool,
    ) -> Result<ComparisonView, ForgeError> {
        let reload = {
            let mut state = self.state.lock();
            state.include_unchanged = include_unchanged;
            let lacks_rows = state.raw.is_some() && !state.raw_include_unchanged;
            match state.params {
                Some(params) if include_unchanged && lacks_rows => Some(params),
                _ => None,
            }
        };
        match reload {
            Some((project, baseline)) => {
                tracing::debug!(%project, %baseline, "fetching on-track rows");
                self.run(project, baseline, false).await
            }
            None => Ok(self.publish()),
        }
    }

    /// Change row order
    pub fn set_sort_key(&self, sort_key: SortKey) -> ComparisonView {
        self.state.lock().sort_key = sort_key;
        self.publish()
    }

    /// Rows to display: filtered by the flag, then sorted by the key
    ///
    /// Computed fresh on every call; empty before the first successful load.
    #[must_use]
    pub fn derived_list(&self) -> Vec<TaskVariance> {
        let (raw, include_unchanged, sort_key) = {
            let state = self.state.lock();
            (state.raw.clone(), state.include_unchanged, state.sort_key)
        };
        derive(raw.as_deref(), include_unchanged, sort_key)
    }

    /// Derived rows decorated for display
    #[must_use]
    pub fn rows(&self) -> Vec<ComparisonRow> {
        self.derived_list()
            .into_iter()
            .map(ComparisonRow::from)
            .collect()
    }

    /// Current screen snapshot
    #[must_use]
    pub fn view(&self) -> ComparisonView {
        let state = self.state.lock();
        let raw = state.raw.as_deref();
        ComparisonView {
            baseline: raw.map(|c| c.baseline.clone()),
            summary: raw.map(|c| c.summary.clone()),
            rows: derive(raw, state.include_unchanged, state.sort_key)
                .into_iter()
                .map(ComparisonRow::from)
                .collect(),
            tasks_added: raw.map(|c| c.tasks_added.clone()).unwrap_or_default(),
            tasks_deleted: raw.map(|c| c.tasks_deleted.clone()).unwrap_or_default(),
            sort_key: state.sort_key,
            include_unchanged: state.include_unchanged,
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    /// Receive a snapshot after every state transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ComparisonView> {
        self.publisher.subscribe()
    }

    /// Last fetched payload, if any
    #[must_use]
    pub fn raw(&self) -> Option<Arc<BaselineComparison>> {
        self.state.lock().raw.clone()
    }

    /// A fetch is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Last fetch failure
    #[must_use]
    pub fn error(&self) -> Option<ForgeError> {
        self.state.lock().error.clone()
    }

    /// Current sort key
    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.state.lock().sort_key
    }

    /// Current include-unchanged flag
    #[must_use]
    pub fn include_unchanged(&self) -> bool {
        self.state.lock().include_unchanged
    }

    /// Cache key of the current parameters
    #[must_use]
    pub fn current_key(&self) -> Option<QueryKey> {
        self.state.lock().key()
    }

    fn publish(&self) -> ComparisonView {
        let view = self.view();
        self.publisher.send_replace(view.clone());
        view
    }
}

fn derive(
    raw: Option<&BaselineComparison>,
    include_unchanged: bool,
    sort_key: SortKey,
) -> Vec<TaskVariance> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut rows = filter_variances(&raw.task_variances, include_unchanged);
    sort_in_place(&mut rows, sort_key);
    rows
}
