//! SprintForge Baseline - comparison view model and lifecycle control
//!
//! The client-side logic behind the baseline screens:
//! - Variance classification for badges and accessible labels
//! - Filtering of unchanged tasks and ordering of comparison rows
//! - [`ComparisonViewModel`]: fetched payload plus UI state, derived rows
//! - [`BaselineListModel`]: a project's baseline list
//! - [`BaselineLifecycleController`]: create, delete, activate with
//!   per-operation pending state and cache invalidation
//! - [`ComparisonPoller`]: periodic refresh of a comparison
//!
//! # Example
//!
//! ```rust,ignore
//! use sprintforge_baseline::{ComparisonViewModel, SortKey};
//! use sprintforge_query::QueryCache;
//!
//! # async fn example(api: std::sync::Arc<dyn sprintforge_client::BaselineApi>) -> Result<(), sprintforge_model::ForgeError> {
//! let cache = QueryCache::default();
//! let vm = ComparisonViewModel::new(api, cache);
//! vm.load(project_id, baseline_id).await?;
//!
//! for row in vm.set_sort_key(SortKey::Name).rows {
//!     println!("{:<30} {}", row.task.task_name, row.display.display_text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod confirm;
pub mod filter;
pub mod lifecycle;
pub mod list;
pub mod poller;
pub mod sort;
pub mod variance;
pub mod view_model;

pub use confirm::{AutoConfirm, Confirmation};
pub use filter::filter_variances;
pub use lifecycle::{BaselineLifecycleController, OperationKey, OperationStatus};
pub use list::BaselineListModel;
pub use poller::{ComparisonPoller, DEFAULT_POLL_INTERVAL};
pub use sort::{sort_variances, SortKey};
pub use variance::{classify, VarianceDisplay};
pub use view_model::{ComparisonRow, ComparisonView, ComparisonViewModel};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building baseline screens
    pub use crate::{
        BaselineLifecycleController, BaselineListModel, ComparisonPoller, ComparisonView,
        ComparisonViewModel, Confirmation, SortKey,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
