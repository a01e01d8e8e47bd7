//! Baseline list state

use parking_lot::Mutex;
use sprintforge_client::BaselineApi;
use sprintforge_model::{Baseline, BaselineList, ForgeError, ProjectId};
use sprintforge_query::{QueryCache, QueryKey};
use std::sync::Arc;

#[derive(Debug, Default)]
struct ListState {
    page: Option<Arc<BaselineList>>,
    params: Option<(ProjectId, u32, u32)>,
    loading: bool,
    error: Option<ForgeError>,
    generation: u64,
}

/// View model for a project's baseline list
///
/// Reads through the shared cache, so a lifecycle mutation that invalidates
/// the project's list makes the next `load` hit the network.
pub struct BaselineListModel {
    api: Arc<dyn BaselineApi>,
    cache: QueryCache,
    state: Mutex<ListState>,
}

impl std::fmt::Debug for BaselineListModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineListModel")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl BaselineListModel {
    /// Create list model
    #[must_use]
    pub fn new(api: Arc<dyn BaselineApi>, cache: QueryCache) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Load one page of a project's baselines
    ///
    /// # Errors
    /// `ForgeError::Validation` for a zero page or limit; otherwise the
    /// fetch failure, which leaves the previous page in place.
    pub async fn load(
        &self,
        project: ProjectId,
        page: u32,
        limit: u32,
    ) -> Result<Arc<BaselineList>, ForgeError> {
        if page == 0 || limit == 0 {
            return Err(ForgeError::validation("page", "page and limit start at 1"));
        }
        let generation = {
            let mut state = self.state.lock();
            if state.params.map(|(p, _, _)| p) != Some(project) {
                state.page = None;
            }
            state.params = Some((project, page, limit));
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        let api = Arc::clone(&self.api);
        let result = self
            .cache
            .fetch(QueryKey::BaselineList { project, page, limit }, move || async move {
                api.list_baselines(project, page, limit).await
            })
            .await;

        let mut state = self.state.lock();
        if state.generation == generation {
            state.loading = false;
            match &result {
                Ok(list) => {
                    state.page = Some(Arc::clone(list));
                    state.error = None;
                }
                Err(e) => state.error = Some(e.clone()),
            }
        }
        result
    }

    /// Baselines on the loaded page
    #[must_use]
    pub fn baselines(&self) -> Vec<Baseline> {
        self.state
            .lock()
            .page
            .as_ref()
            .map(|p| p.baselines.clone())
            .unwrap_or_default()
    }

    /// Total baselines across all pages
    #[must_use]
    pub fn total(&self) -> u64 {
        self.state.lock().page.as_ref().map_or(0, |p| p.total)
    }

    /// The active baseline on the loaded page
    #[must_use]
    pub fn active(&self) -> Option<Baseline> {
        self.state
            .lock()
            .page
            .as_ref()
            .and_then(|p| p.active().cloned())
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
}
