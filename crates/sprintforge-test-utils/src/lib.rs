//! Testing utilities for SprintForge workspace
//!
//! Shared fixtures and an in-memory API that behaves like the real one.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sprintforge_client::BaselineApi;
use sprintforge_model::{
    ActivateResponse, Baseline, BaselineComparison, BaselineDetail, BaselineId, BaselineList,
    BaselineRef, BaselineSnapshot, ComparisonSummary, CreateBaselineRequest, ForgeError,
    ProjectId, TaskId, TaskVariance, VarianceStatus, MAX_SNAPSHOT_BYTES,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Comparison payload for `baseline` with one row per `(name, variance_days)`
pub fn comparison_with(baseline: BaselineId, rows: &[(&str, f64)]) -> BaselineComparison {
    let task_variances: Vec<TaskVariance> = rows
        .iter()
        .map(|(name, days)| TaskVariance::new(TaskId::new(), *name, *days))
        .collect();
    let count = |status: VarianceStatus| {
        u32::try_from(task_variances.iter().filter(|t| t.status() == status).count()).unwrap_or(u32::MAX)
    };
    let summary = ComparisonSummary {
        total_tasks: u32::try_from(task_variances.len()).unwrap_or(u32::MAX),
        tasks_ahead: count(VarianceStatus::Ahead),
        tasks_behind: count(VarianceStatus::Behind),
        tasks_on_track: count(VarianceStatus::OnTrack),
        avg_variance_days: if task_variances.is_empty() {
            0.0
        } else {
            task_variances.iter().map(|t| t.variance_days).sum::<f64>() / task_variances.len() as f64
        },
        critical_path_variance_days: 0.0,
    };
    BaselineComparison {
        baseline: BaselineRef {
            id: baseline,
            name: "fixture".to_string(),
            created_at: Utc::now(),
        },
        comparison_date: Utc::now(),
        summary,
        task_variances,
        tasks_added: Vec::new(),
        tasks_deleted: Vec::new(),
    }
}

pub fn baseline_named(project: ProjectId, name: &str, active: bool) -> Baseline {
    Baseline {
        id: BaselineId::new(),
        project_id: project,
        name: name.to_string(),
        description: None,
        created_at: Utc::now(),
        is_active: active,
        snapshot_size_bytes: 1024,
    }
}

#[derive(Default)]
struct FakeState {
    baselines: Vec<Baseline>,
    comparisons: HashMap<BaselineId, BaselineComparison>,
    snapshot_sizes: HashMap<ProjectId, u64>,
    failures: Vec<ForgeError>,
    calls: HashMap<&'static str, usize>,
    last_include_unchanged: Option<bool>,
}

/// In-memory stand-in for the SprintForge baseline API
///
/// Enforces what the real API enforces: one active baseline per project,
/// the snapshot size ceiling on create, 404 for unknown ids, and the
/// `include_unchanged` filter on comparisons.
#[derive(Default)]
pub struct FakeBaselineApi {
    state: Mutex<FakeState>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeBaselineApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a baseline; an active one deactivates the project's others
    pub fn seed_baseline(&self, project: ProjectId, name: &str, active: bool) -> BaselineId {
        let baseline = baseline_named(project, name, active);
        let id = baseline.id;
        let mut state = self.state.lock();
        if active {
            for b in state.baselines.iter_mut().filter(|b| b.project_id == project) {
                b.is_active = false;
            }
        }
        state.baselines.push(baseline);
        id
    }

    pub fn set_comparison(&self, baseline: BaselineId, comparison: BaselineComparison) {
        self.state.lock().comparisons.insert(baseline, comparison);
    }

    /// Snapshot size the next create for `project` would produce
    pub fn set_snapshot_size(&self, project: ProjectId, bytes: u64) {
        self.state.lock().snapshot_sizes.insert(project, bytes);
    }

    /// Fail the next call, whatever it is
    pub fn fail_next(&self, error: ForgeError) {
        self.state.lock().failures.push(error);
    }

    /// Make every subsequent call wait for a permit on the returned semaphore
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// Number of calls to an endpoint: list, get, create, delete, activate, compare
    pub fn calls(&self, endpoint: &str) -> usize {
        self.state.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn last_include_unchanged(&self) -> Option<bool> {
        self.state.lock().last_include_unchanged
    }

    pub fn baselines(&self, project: ProjectId) -> Vec<Baseline> {
        self.state
            .lock()
            .baselines
            .iter()
            .filter(|b| b.project_id == project)
            .cloned()
            .collect()
    }

    async fn enter(&self, endpoint: &'static str) -> Result<(), ForgeError> {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        let mut state = self.state.lock();
        *state.calls.entry(endpoint).or_default() += 1;
        if state.failures.is_empty() {
            Ok(())
        } else {
            Err(state.failures.remove(0))
        }
    }

    fn not_found() -> ForgeError {
        ForgeError::NotFound("Baseline not found".to_string())
    }
}

#[async_trait]
impl BaselineApi for FakeBaselineApi {
    async fn list_baselines(
        &self,
        project: ProjectId,
        page: u32,
        limit: u32,
    ) -> Result<BaselineList, ForgeError> {
        self.enter("list").await?;
        let all = self.baselines(project);
        let start = (page.saturating_sub(1) as usize) * limit as usize;
        Ok(BaselineList {
            baselines: all.iter().skip(start).take(limit as usize).cloned().collect(),
            total: all.len() as u64,
            page,
            limit,
        })
    }

    async fn get_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<BaselineDetail, ForgeError> {
        self.enter("get").await?;
        self.baselines(project)
            .into_iter()
            .find(|b| b.id == baseline)
            .map(|baseline| BaselineDetail {
                baseline,
                snapshot: BaselineSnapshot::default(),
            })
            .ok_or_else(Self::not_found)
    }

    async fn create_baseline(
        &self,
        project: ProjectId,
        request: CreateBaselineRequest,
    ) -> Result<Baseline, ForgeError> {
        self.enter("create").await?;
        let mut state = self.state.lock();
        let size = state.snapshot_sizes.get(&project).copied().unwrap_or(1024);
        if size > MAX_SNAPSHOT_BYTES {
            return Err(ForgeError::PayloadTooLarge(
                "Baseline snapshot exceeds the 10MB size limit".to_string(),
            ));
        }
        let mut baseline = baseline_named(project, &request.name, false);
        baseline.description = request.description;
        baseline.snapshot_size_bytes = size;
        state.baselines.push(baseline.clone());
        Ok(baseline)
    }

    async fn delete_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<(), ForgeError> {
        self.enter("delete").await?;
        let mut state = self.state.lock();
        let before = state.baselines.len();
        state
            .baselines
            .retain(|b| !(b.project_id == project && b.id == baseline));
        if state.baselines.len() == before {
            return Err(Self::not_found());
        }
        state.comparisons.remove(&baseline);
        Ok(())
    }

    async fn activate_baseline(
        &self,
        project: ProjectId,
        baseline: BaselineId,
    ) -> Result<ActivateResponse, ForgeError> {
        self.enter("activate").await?;
        let mut state = self.state.lock();
        if !state
            .baselines
            .iter()
            .any(|b| b.project_id == project && b.id == baseline)
        {
            return Err(Self::not_found());
        }
        for b in state.baselines.iter_mut().filter(|b| b.project_id == project) {
            b.is_active = b.id == baseline;
        }
        Ok(ActivateResponse {
            id: baseline,
            is_active: true,
            message: "Baseline activated".to_string(),
        })
    }

    async fn compare_baseline(
        &self,
        _project: ProjectId,
        baseline: BaselineId,
        include_unchanged: bool,
    ) -> Result<BaselineComparison, ForgeError> {
        self.enter("compare").await?;
        let mut state = self.state.lock();
        state.last_include_unchanged = Some(include_unchanged);
        let mut comparison = state
            .comparisons
            .get(&baseline)
            .cloned()
            .ok_or_else(Self::not_found)?;
        if !include_unchanged {
            comparison
                .task_variances
                .retain(|t| t.status() != VarianceStatus::OnTrack);
        }
        Ok(comparison)
    }
}
