//! SprintForge Client - typed access to the baseline endpoints
//!
//! - [`BaselineApi`]: the collaborator trait every view model is written
//!   against, so tests can swap in fakes or mocks
//! - [`HttpBaselineApi`]: the `reqwest` implementation
//! - [`ClientConfig`]: endpoint, timeouts, paging and refresh settings
//! - [`TokenProvider`]: source of the bearer token attached to requests
//!
//! # Example
//!
//! ```rust,ignore
//! use sprintforge_client::{BaselineApi, ClientConfig, HttpBaselineApi, StaticToken};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), sprintforge_model::ForgeError> {
//! let config = ClientConfig::new("https://api.sprintforge.dev/api/v1");
//! let api = HttpBaselineApi::new(&config, Arc::new(StaticToken::new("token")))?;
//! let page = api.list_baselines(project_id, 1, 20).await?;
//! println!("{} baselines", page.total);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod http;

pub use api::BaselineApi;
#[cfg(feature = "mock")]
pub use api::MockBaselineApi;
pub use auth::{StaticToken, TokenProvider};
pub use config::ClientConfig;
pub use http::{translate_status, HttpBaselineApi};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
