//! Baseline create/delete/activate
//!
//! Each operation runs as an independent async unit with its own pending
//! flag and last-error slot, keyed by operation and entity. Operations on
//! different entities overlap freely; resubmitting the same operation on the
//! same entity while it is pending fails fast.

use crate::confirm::Confirmation;
use dashmap::DashMap;
use sprintforge_client::BaselineApi;
use sprintforge_model::{
    ActivateResponse, Baseline, BaselineId, CreateBaselineRequest, ForgeError, Operation,
    ProjectId,
};
use sprintforge_query::{QueryCache, QueryKey};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identity of one lifecycle operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationKey {
    /// Operation kind
    pub operation: Operation,
    /// Project the operation targets
    pub project: ProjectId,
    /// Baseline the operation targets; `None` for create
    pub baseline: Option<BaselineId>,
}

impl OperationKey {
    /// Key for creating a baseline in `project`
    #[inline]
    #[must_use]
    pub fn create(project: ProjectId) -> Self {
        Self {
            operation: Operation::Create,
            project,
            baseline: None,
        }
    }

    /// Key for deleting `baseline`
    #[inline]
    #[must_use]
    pub fn delete(project: ProjectId, baseline: BaselineId) -> Self {
        Self {
            operation: Operation::Delete,
            project,
            baseline: Some(baseline),
        }
    }

    /// Key for activating `baseline`
    #[inline]
    #[must_use]
    pub fn activate(project: ProjectId, baseline: BaselineId) -> Self {
        Self {
            operation: Operation::Activate,
            project,
            baseline: Some(baseline),
        }
    }
}

/// Pending flag and last error of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationStatus {
    /// In flight; the triggering control should be disabled
    pub pending: bool,
    /// Failure of the most recent attempt
    pub last_error: Option<ForgeError>,
}

/// Clears the pending flag when the operation ends, however it ends
struct PendingGuard<'a> {
    operations: &'a DashMap<OperationKey, OperationStatus>,
    key: OperationKey,
}

impl PendingGuard<'_> {
    fn fail(&self, error: &ForgeError) {
        if let Some(mut status) = self.operations.get_mut(&self.key) {
            status.last_error = Some(error.clone());
        }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut status) = self.operations.get_mut(&self.key) {
            status.pending = false;
        }
    }
}

/// Runs baseline mutations and invalidates affected cache entries
pub struct BaselineLifecycleController {
    api: Arc<dyn BaselineApi>,
    cache: QueryCache,
    confirm: Arc<dyn Confirmation>,
    operations: DashMap<OperationKey, OperationStatus>,
    create_dialog_open: AtomicBool,
}

impl std::fmt::Debug for BaselineLifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaselineLifecycleController")
            .field("operations", &self.operations.len())
            .field("create_dialog_open", &self.is_create_dialog_open())
            .finish_non_exhaustive()
    }
}

impl BaselineLifecycleController {
    /// Create controller
    #[must_use]
    pub fn new(
        api: Arc<dyn BaselineApi>,
        cache: QueryCache,
        confirm: Arc<dyn Confirmation>,
    ) -> Self {
        Self {
            api,
            cache,
            confirm,
            operations: DashMap::new(),
            create_dialog_open: AtomicBool::new(false),
        }
    }

    /// Capture a new baseline
    ///
    /// The name is checked before anything is sent or marked pending. On
    /// success the project's cached lists are invalidated and the creation
    /// dialog is closed.
    ///
    /// # Errors
    /// - `ForgeError::Validation` for a blank or over-long name
    /// - `ForgeError::AlreadyPending` if a create for the project is in flight
    /// - `ForgeError::PayloadTooLarge` if the snapshot exceeds the size ceiling
    /// - any other API failure
    pub async fn create(
        &self,
        project: ProjectId,
        name: &str,
        description: Option<String>,
    ) -> Result<Baseline, ForgeError> {
        let key = OperationKey::create(project);
        let request = CreateBaselineRequest::new(name, description);
        if let Err(e) = request.validate() {
            self.record_error(key, &e);
            return Err(e);
        }

        let guard = self.begin(key)?;
        tracing::info!(%project, name = %request.name, "creating baseline");
        match self.api.create_baseline(project, request).await {
            Ok(baseline) => {
                self.cache.invalidate_baseline_lists(project).await;
                self.close_create_dialog();
                tracing::info!(%project, baseline = %baseline.id, "baseline created");
                Ok(baseline)
            }
            Err(e) => {
                tracing::error!(%project, error = %e, "baseline creation failed");
                guard.fail(&e);
                Err(e)
            }
        }
    }

    /// Delete a baseline after confirmation
    ///
    /// # Errors
    /// - `ForgeError::Cancelled` if the user declines; nothing is sent
    /// - `ForgeError::AlreadyPending` if a delete of the baseline is in flight
    /// - any API failure
    pub async fn delete(&self, project: ProjectId, baseline: BaselineId) -> Result<(), ForgeError> {
        let guard = self.begin(OperationKey::delete(project, baseline))?;

        let prompt = format!("Delete baseline {baseline}? This cannot be undone.");
        if !self.confirm.confirm(&prompt).await {
            tracing::debug!(%project, %baseline, "delete declined");
            return Err(ForgeError::Cancelled);
        }

        tracing::info!(%project, %baseline, "deleting baseline");
        match self.api.delete_baseline(project, baseline).await {
            Ok(()) => {
                self.cache.invalidate_baseline_lists(project).await;
                self.cache.invalidate_baseline(project, baseline).await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(%project, %baseline, error = %e, "baseline deletion failed");
                guard.fail(&e);
                Err(e)
            }
        }
    }

    /// Make a baseline the project's active comparison reference
    ///
    /// The API deactivates every other baseline of the project; afterwards
    /// all cached lists and details of the project are invalidated so they
    /// show the new single active baseline.
    ///
    /// # Errors
    /// - `ForgeError::AlreadyPending` if an activate of the baseline is in flight
    /// - any API failure
    pub async fn activate(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<ActivateResponse, ForgeError> {
        let guard = self.begin(OperationKey::activate(project, baseline))?;

        tracing::info!(%project, %baseline, "activating baseline");
        match self.api.activate_baseline(project, baseline).await {
            Ok(response) => {
                self.cache
                    .invalidate_where(|key| {
                        key.project() == project && !matches!(key, QueryKey::Comparison { .. })
                    })
                    .await;
                Ok(response)
            }
            Err(e) => {
                tracing::error!(%project, %baseline, error = %e, "baseline activation failed");
                guard.fail(&e);
                Err(e)
            }
        }
    }

    /// Pending flag and last error of an operation
    #[must_use]
    pub fn status(&self, key: &OperationKey) -> OperationStatus {
        self.operations
            .get(key)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Check if an operation is in flight
    #[must_use]
    pub fn is_pending(&self, key: &OperationKey) -> bool {
        self.operations.get(key).is_some_and(|s| s.pending)
    }

    /// Operations currently in flight
    #[must_use]
    pub fn pending(&self) -> Vec<OperationKey> {
        self.operations
            .iter()
            .filter(|entry| entry.value().pending)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Open the creation dialog
    pub fn open_create_dialog(&self) {
        self.create_dialog_open.store(true, Ordering::Release);
    }

    /// Close the creation dialog
    pub fn close_create_dialog(&self) {
        self.create_dialog_open.store(false, Ordering::Release);
    }

    /// Check if the creation dialog is open
    #[must_use]
    pub fn is_create_dialog_open(&self) -> bool {
        self.create_dialog_open.load(Ordering::Acquire)
    }

    fn begin(&self, key: OperationKey) -> Result<PendingGuard<'_>, ForgeError> {
        {
            let mut status = self.operations.entry(key).or_default();
            if status.pending {
                return Err(ForgeError::AlreadyPending {
                    operation: key.operation,
                });
            }
            status.pending = true;
            status.last_error = None;
        }
        Ok(PendingGuard {
            operations: &self.operations,
            key,
        })
    }

    fn record_error(&self, key: OperationKey, error: &ForgeError) {
        self.operations.entry(key).or_default().last_error = Some(error.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AutoConfirm;
    use mockall::predicate::eq;
    use sprintforge_client::MockBaselineApi;
    use sprintforge_test_utils::FakeBaselineApi;

    fn controller(api: Arc<dyn BaselineApi>, confirm: bool) -> BaselineLifecycleController {
        BaselineLifecycleController::new(api, QueryCache::new(100), Arc::new(AutoConfirm(confirm)))
    }

    #[tokio::test]
    async fn empty_name_never_reaches_the_api() {
        let mut mock = MockBaselineApi::new();
        mock.expect_create_baseline().never();
        let project = ProjectId::new();
        let ctl = controller(Arc::new(mock), true);

        let err = ctl.create(project, "", None).await.unwrap_err();

        assert!(matches!(err, ForgeError::Validation { .. }));
        let status = ctl.status(&OperationKey::create(project));
        assert!(!status.pending);
        assert_eq!(status.last_error, Some(err));
    }

    #[tokio::test]
    async fn declined_delete_sends_nothing() {
        let mut mock = MockBaselineApi::new();
        mock.expect_delete_baseline().never();
        let project = ProjectId::new();
        let baseline = BaselineId::new();
        let ctl = controller(Arc::new(mock), false);

        let err = ctl.delete(project, baseline).await.unwrap_err();

        assert_eq!(err, ForgeError::Cancelled);
        assert!(!ctl.is_pending(&OperationKey::delete(project, baseline)));
    }

    #[tokio::test]
    async fn confirmed_delete_calls_api_once() {
        let project = ProjectId::new();
        let baseline = BaselineId::new();
        let mut mock = MockBaselineApi::new();
        mock.expect_delete_baseline()
            .with(eq(project), eq(baseline))
            .times(1)
            .returning(|_, _| Ok(()));
        let ctl = controller(Arc::new(mock), true);

        ctl.delete(project, baseline).await.unwrap();
        assert_eq!(ctl.status(&OperationKey::delete(project, baseline)), OperationStatus::default());
    }

    #[tokio::test]
    async fn create_failure_is_recorded_and_pending_cleared() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        api.set_snapshot_size(project, sprintforge_model::MAX_SNAPSHOT_BYTES + 1);
        let ctl = controller(api.clone(), true);
        ctl.open_create_dialog();

        let err = ctl.create(project, "Too big", None).await.unwrap_err();

        assert!(matches!(err, ForgeError::PayloadTooLarge(_)));
        let status = ctl.status(&OperationKey::create(project));
        assert!(!status.pending);
        assert_eq!(status.last_error, Some(err));
        assert!(ctl.is_create_dialog_open());
    }

    #[tokio::test]
    async fn successful_create_closes_dialog_and_clears_error() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let ctl = controller(api.clone(), true);
        ctl.open_create_dialog();
        let _ = ctl.create(project, " ", None).await;

        let baseline = ctl
            .create(project, "Sprint 5", Some("after scope cut".into()))
            .await
            .unwrap();

        assert_eq!(baseline.name, "Sprint 5");
        assert!(!ctl.is_create_dialog_open());
        assert_eq!(ctl.status(&OperationKey::create(project)).last_error, None);
    }

    #[tokio::test]
    async fn duplicate_submission_is_rejected_while_pending() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let baseline = api.seed_baseline(project, "b", false);
        let gate = api.hold();
        let ctl = Arc::new(controller(api.clone(), true));
        let key = OperationKey::activate(project, baseline);

        let first = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.activate(project, baseline).await })
        };
        while !ctl.is_pending(&key) {
            tokio::task::yield_now().await;
        }

        let second = ctl.activate(project, baseline).await.unwrap_err();
        assert_eq!(
            second,
            ForgeError::AlreadyPending {
                operation: Operation::Activate
            }
        );
        assert_eq!(ctl.pending(), vec![key]);

        gate.add_permits(1);
        first.await.unwrap().unwrap();
        assert!(!ctl.is_pending(&key));
        assert_eq!(api.calls("activate"), 1);
    }

    #[tokio::test]
    async fn different_entities_run_concurrently() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let doomed = api.seed_baseline(project, "doomed", false);
        let gate = api.hold();
        let ctl = Arc::new(controller(api.clone(), true));

        let delete = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.delete(project, doomed).await })
        };
        let create = {
            let ctl = Arc::clone(&ctl);
            tokio::spawn(async move { ctl.create(project, "fresh", None).await })
        };
        while ctl.pending().len() < 2 {
            tokio::task::yield_now().await;
        }

        gate.add_permits(2);
        delete.await.unwrap().unwrap();
        create.await.unwrap().unwrap();
        assert!(ctl.pending().is_empty());
    }
}
