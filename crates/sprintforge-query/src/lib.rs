//! SprintForge Query - shared response cache
//!
//! A keyed store for API responses that every view reads through:
//! - `fetch` returns the cached value or runs the loader
//! - `invalidate*` drops entries after a mutation so the next read is fresh
//! - `subscribe` notifies every consumer of updates and invalidations
//!
//! The cache is an injected dependency: clone it into each component that
//! needs it. Clones share storage and subscriptions.

pub mod cache;
pub mod key;

pub use cache::{CacheEvent, CacheStats, QueryCache};
pub use key::QueryKey;
