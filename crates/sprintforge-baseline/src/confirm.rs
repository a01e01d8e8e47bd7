//! Confirmation for destructive actions

use async_trait::async_trait;

/// Asks the user to confirm a destructive action
///
/// The controller waits for the answer before anything is sent.
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// `true` to proceed
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Fixed answer, for non-interactive use (`--yes`) and tests
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmation for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, answer = self.0, "auto-confirm");
        self.0
    }
}
