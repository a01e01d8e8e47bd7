//! Periodic comparison refresh
//!
//! Refreshes a [`ComparisonViewModel`] on a fixed interval, and immediately
//! whenever the cache entry it shows is invalidated. Refresh runs whether or
//! not anyone is looking; failures are logged and the next tick tries again.

use crate::view_model::ComparisonViewModel;
use sprintforge_query::{CacheEvent, QueryCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default comparison refresh interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Handle to a running refresh task; dropping it stops the task
#[derive(Debug)]
pub struct ComparisonPoller {
    handle: JoinHandle<()>,
}

impl ComparisonPoller {
    /// Start refreshing `view_model` every `interval`
    ///
    /// The first refresh happens one interval from now.
    #[must_use]
    pub fn spawn(
        view_model: Arc<ComparisonViewModel>,
        cache: &QueryCache,
        interval: Duration,
    ) -> Self {
        let mut events = cache.subscribe();
        let start = tokio::time::Instant::now() + interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::trace!("comparison refresh tick");
                    }
                    event = events.recv() => match event {
                        Ok(CacheEvent::Invalidated(key)) if Some(key) == view_model.current_key() => {
                            tracing::debug!(?key, "comparison invalidated; refreshing");
                        }
                        Ok(_) | Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                }
                if view_model.current_key().is_none() {
                    continue;
                }
                if let Err(e) = view_model.refetch().await {
                    tracing::warn!(error = %e, "comparison refresh failed");
                }
            }
        });
        Self { handle }
    }

    /// Stop refreshing
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Check if the task has ended
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ComparisonPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprintforge_model::{ForgeError, ProjectId};
    use sprintforge_test_utils::{comparison_with, FakeBaselineApi};

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_on_every_interval() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let baseline = api.seed_baseline(project, "b", true);
        api.set_comparison(baseline, comparison_with(baseline, &[("a", 1.0)]));
        let cache = QueryCache::new(100);
        let vm = Arc::new(ComparisonViewModel::new(api.clone(), cache.clone()));
        vm.load(project, baseline).await.unwrap();

        let _poller = ComparisonPoller::spawn(Arc::clone(&vm), &cache, DEFAULT_POLL_INTERVAL);
        settle().await;
        assert_eq!(api.calls("compare"), 1);

        api.set_comparison(baseline, comparison_with(baseline, &[("a", 1.0), ("b", -4.0)]));
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        settle().await;
        assert_eq!(api.calls("compare"), 2);
        assert_eq!(vm.derived_list().len(), 2);

        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        settle().await;
        assert_eq!(api.calls("compare"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_rows_and_recovers() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let baseline = api.seed_baseline(project, "b", true);
        api.set_comparison(baseline, comparison_with(baseline, &[("a", 1.0)]));
        let cache = QueryCache::new(100);
        let vm = Arc::new(ComparisonViewModel::new(api.clone(), cache.clone()));
        vm.load(project, baseline).await.unwrap();
        let _poller = ComparisonPoller::spawn(Arc::clone(&vm), &cache, Duration::from_secs(5));

        api.fail_next(ForgeError::Network("timeout".into()));
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(vm.error().is_some());
        assert_eq!(vm.derived_list().len(), 1);

        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(vm.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn first_refresh_is_one_interval_after_spawn() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let baseline = api.seed_baseline(project, "b", true);
        api.set_comparison(baseline, comparison_with(baseline, &[("a", 1.0)]));
        let cache = QueryCache::new(100);
        let vm = Arc::new(ComparisonViewModel::new(api.clone(), cache.clone()));
        vm.load(project, baseline).await.unwrap();

        let _poller = ComparisonPoller::spawn(Arc::clone(&vm), &cache, Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert_eq!(api.calls("compare"), 2);
    }

    #[tokio::test]
    async fn invalidation_triggers_refresh() {
        let api = Arc::new(FakeBaselineApi::new());
        let project = ProjectId::new();
        let baseline = api.seed_baseline(project, "b", true);
        api.set_comparison(baseline, comparison_with(baseline, &[("a", 1.0)]));
        let cache = QueryCache::new(100);
        let vm = Arc::new(ComparisonViewModel::new(api.clone(), cache.clone()));
        vm.load(project, baseline).await.unwrap();
        let _poller = ComparisonPoller::spawn(Arc::clone(&vm), &cache, DEFAULT_POLL_INTERVAL);
        settle().await;

        cache.invalidate_baseline(project, baseline).await;
        settle().await;
        assert_eq!(api.calls("compare"), 2);
    }

    #[tokio::test]
    async fn stop_ends_task() {
        let api = Arc::new(FakeBaselineApi::new());
        let cache = QueryCache::new(100);
        let vm = Arc::new(ComparisonViewModel::new(api, cache.clone()));
        let poller = ComparisonPoller::spawn(vm, &cache, DEFAULT_POLL_INTERVAL);
        assert!(!poller.is_finished());
        poller.stop();
    }
}
