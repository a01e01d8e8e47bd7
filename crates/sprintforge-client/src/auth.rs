//! Bearer token sources

use async_trait::async_trait;

/// Supplies the bearer token for the current session
///
/// `None` means nobody is signed in; requests are refused locally instead of
/// being sent without credentials.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current token, if signed in
    async fn bearer_token(&self) -> Option<String>;
}

/// Fixed token, typically read from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticToken {
    token: Option<String>,
}

impl StaticToken {
    /// Signed-in session with the given token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Signed-out session
    #[must_use]
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Token from an optional value; blank strings count as signed out
    #[must_use]
    pub fn from_option(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}
