//! Baseline API collaborator trait

use async_trait::async_trait;
use sprintforge_model::{
    ActivateResponse, Baseline, BaselineComparison, BaselineDetail, BaselineId, BaselineList,
    CreateBaselineRequest, ForgeError, ProjectId,
};

/// The baseline endpoints of the SprintForge API
///
/// Implementations normalize every failure into a [`ForgeError`] and never
/// retry on their own; retries are an explicit caller decision.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait BaselineApi: Send + Sync {
    /// `GET /projects/{project}/baselines?page&limit`
    async fn list_baselines(
        &self,
        project: ProjectId,
        page: u32,
        limit: u32,
    ) -> Result<BaselineList, ForgeError>;

    /// `GET /projects/{project}/baselines/{baseline}`
    async fn get_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<BaselineDetail, ForgeError>;

    /// `POST /projects/{project}/baselines`
    ///
    /// # Errors
    /// `ForgeError::PayloadTooLarge` when the snapshot would exceed the
    /// API's size ceiling.
    async fn create_baseline(
        &self,
        project: ProjectId,
        request: CreateBaselineRequest,
    ) -> Result<Baseline, ForgeError>;

    /// `DELETE /projects/{project}/baselines/{baseline}`
    async fn delete_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<(), ForgeError>;

    /// `PATCH /projects/{project}/baselines/{baseline}/activate`
    ///
    /// The API deactivates every other baseline of the project.
    async fn activate_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<ActivateResponse, ForgeError>;

    /// `GET /projects/{project}/baselines/{baseline}/compare?include_unchanged`
    async fn compare_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
        include_unchanged: bool,
    ) -> Result<BaselineComparison, ForgeError>;
}
