//! Client configuration
//!
//! Layered the usual way: built-in defaults, then a TOML file, then
//! environment overrides, then whatever the caller sets explicitly.

use serde::{Deserialize, Serialize};
use sprintforge_model::ForgeError;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`ClientConfig::base_url`]
pub const ENV_API_URL: &str = "SPRINTFORGE_API_URL";

/// Environment variable carrying the bearer token
pub const ENV_TOKEN: &str = "SPRINTFORGE_TOKEN";

/// SprintForge client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `https://api.sprintforge.dev/api/v1`
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
    /// Default page size for baseline listings
    pub page_limit: u32,
    /// Comparison auto-refresh interval in seconds
    pub poll_interval_secs: u64,
    /// How long a cached response stays fresh, in seconds
    pub cache_ttl_secs: u64,
    /// Maximum cached responses
    pub cache_capacity: u64,
    /// Bearer token; usually supplied through the environment
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl ClientConfig {
    /// Default configuration against the given API root
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// `ForgeError::Config` if the document is not valid TOML for this shape.
    pub fn from_toml_str(source: &str) -> Result<Self, ForgeError> {
        toml::from_str(source).map_err(|e| ForgeError::Config(e.to_string()))
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// `ForgeError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ForgeError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ForgeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Apply `SPRINTFORGE_API_URL` and `SPRINTFORGE_TOKEN` when set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        )
    }

    /// Apply optional overrides; `None` and blank values keep the current setting
    #[must_use]
    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// With default page size
    #[inline]
    #[must_use]
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// With comparison refresh interval
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs().max(1);
        self
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Comparison refresh interval
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Cache freshness window
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Check the settings are usable
    ///
    /// # Errors
    /// `ForgeError::Config` for a base URL that is not absolute http(s), or
    /// zero page size, timeout, or poll interval.
    pub fn validate(&self) -> Result<(), ForgeError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ForgeError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ForgeError::Config(format!(
                "base_url must be http or https, got {}",
                url.scheme()
            )));
        }
        if self.page_limit == 0 {
            return Err(ForgeError::Config("page_limit must be positive".into()));
        }
        if self.timeout_secs == 0 || self.poll_interval_secs == 0 {
            return Err(ForgeError::Config(
                "timeout_secs and poll_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: 30,
            user_agent: format!("sprintforge/{}", crate::VERSION),
            page_limit: 20,
            poll_interval_secs: 30,
            cache_ttl_secs: 30,
            cache_capacity: 1_000,
            token: None,
        }
    }
}
