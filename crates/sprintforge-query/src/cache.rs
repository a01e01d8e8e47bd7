//! Keyed response cache using moka
//!
//! Values are stored type-erased and handed out as `Arc<T>`, so every
//! consumer of a key shares one immutable response. Nothing hands out
//! mutable access: the only ways to change an entry are a fresh load or an
//! invalidation.

use crate::key::QueryKey;
use moka::future::Cache;
use sprintforge_model::{BaselineId, ForgeError, ProjectId};
use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

type Entry = Arc<dyn Any + Send + Sync>;

const EVENT_CAPACITY: usize = 64;

/// Change notification for subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEvent {
    /// A fresh response was stored
    Updated(QueryKey),
    /// An entry was dropped; the next read goes to the network
    Invalidated(QueryKey),
}

impl CacheEvent {
    /// Key the event is about
    #[inline]
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        match self {
            Self::Updated(key) | Self::Invalidated(key) => key,
        }
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
    /// Reads served from cache
    pub hits: u64,
    /// Reads that ran the loader
    pub misses: u64,
}

#[derive(Debug)]
struct Shared {
    events: broadcast::Sender<CacheEvent>,
    // Bumped on every invalidation; a load that started before the bump
    // must not repopulate the cache with what may be pre-mutation data.
    epoch: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Shared API response cache
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<QueryKey, Entry>,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entry_count", &self.inner.entry_count())
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    /// Create new cache with max capacity and no expiry
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self::from_cache(Cache::new(max_capacity))
    }

    /// Create cache whose entries go stale after `ttl`
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self::from_cache(
            Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        )
    }

    fn from_cache(inner: Cache<QueryKey, Entry>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner,
            shared: Arc::new(Shared {
                events,
                epoch: AtomicU64::new(0),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
            }),
        }
    }

    /// Cached value for `key`, if present and of type `T`
    #[must_use]
    pub async fn get<T>(&self, key: &QueryKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.inner
            .get(key)
            .await
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Store a value and notify subscribers
    pub async fn insert<T>(&self, key: QueryKey, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        self.inner.insert(key, value as Entry).await;
        self.notify(CacheEvent::Updated(key));
    }

    /// Get or load a value
    ///
    /// Failures are returned to the caller and never cached. A load that
    /// overlaps an invalidation still returns its result, but does not
    /// store it.
    ///
    /// # Errors
    /// Whatever the loader returns.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, load: F) -> Result<Arc<T>, ForgeError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        if let Some(cached) = self.get::<T>(&key).await {
            self.shared.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(?key, "cache hit");
            return Ok(cached);
        }
        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        self.load(key, load).await
    }

    /// Load a value, bypassing and then replacing any cached entry
    ///
    /// # Errors
    /// Whatever the loader returns.
    pub async fn refetch<T, F, Fut>(&self, key: QueryKey, load: F) -> Result<Arc<T>, ForgeError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        self.load(key, load).await
    }

    async fn load<T, F, Fut>(&self, key: QueryKey, load: F) -> Result<Arc<T>, ForgeError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        let epoch = self.shared.epoch.load(Ordering::Acquire);
        tracing::debug!(?key, "loading");
        let value = Arc::new(load().await?);

        if self.shared.epoch.load(Ordering::Acquire) == epoch {
            self.insert(key, Arc::clone(&value)).await;
        } else {
            tracing::debug!(?key, "invalidated while loading; result not cached");
        }
        Ok(value)
    }

    /// Invalidate one entry
    pub async fn invalidate(&self, key: &QueryKey) {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate(key).await;
        self.notify(CacheEvent::Invalidated(*key));
    }

    /// Invalidate every entry matching `predicate`
    ///
    /// Returns the number of entries dropped.
    pub async fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&QueryKey) -> bool,
    {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        let keys: Vec<QueryKey> = self
            .inner
            .iter()
            .filter(|(key, _)| predicate(key.as_ref()))
            .map(|(key, _)| *key)
            .collect();
        for key in &keys {
            self.inner.invalidate(key).await;
            self.notify(CacheEvent::Invalidated(*key));
        }
        keys.len()
    }

    /// Invalidate every cached page of a project's baseline list
    pub async fn invalidate_baseline_lists(&self, project: ProjectId) -> usize {
        let dropped = self.invalidate_where(|key| key.is_list_of(project)).await;
        tracing::debug!(%project, dropped, "invalidated baseline lists");
        dropped
    }

    /// Invalidate everything cached about one baseline
    pub async fn invalidate_baseline(&self, project: ProjectId, baseline: BaselineId) -> usize {
        self.invalidate_where(|key| key.project() == project && key.baseline() == Some(baseline))
            .await
    }

    /// Invalidate everything cached for a project
    pub async fn invalidate_project(&self, project: ProjectId) -> usize {
        self.invalidate_where(|key| key.project() == project).await
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate_all();
    }

    /// Check if cache holds `key`
    #[inline]
    #[must_use]
    pub async fn contains(&self, key: &QueryKey) -> bool {
        self.inner.get(key).await.is_some()
    }

    /// Receive every subsequent update and invalidation
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.shared.events.subscribe()
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            entry_count: self.inner.entry_count(),
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
        }
    }

    fn notify(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.shared.events.send(event);
    }
}

impl Default for QueryCache {
    /// Create cache with default capacity (1,000 entries) and 30s freshness
    fn default() -> Self {
        Self::with_ttl(1_000, Duration::from_secs(30))
    }
}
