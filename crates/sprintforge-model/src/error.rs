//! Error types for SprintForge clients
//!
//! One taxonomy for every client-side failure:
//! - Validation failures caught before anything is sent
//! - Server-signalled failures, normalized to human-readable messages
//! - Transport failures
//! - Lifecycle guard failures (duplicate submission, declined confirmation)
//!
//! The enum is `Clone` so view models can keep the last error next to the
//! last good data.

use serde::{Deserialize, Serialize};

/// Main SprintForge error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForgeError {
    /// Rejected before submission, or by the API as malformed input
    #[error("invalid {field}: {message}")]
    Validation {
        /// Offending field
        field: String,
        /// What is wrong with it
        message: String,
    },

    /// Baseline snapshot exceeds the API's size ceiling
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// The identifier no longer refers to anything
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or rejected credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other 4xx response
    #[error("request rejected ({status}): {message}")]
    Client {
        /// HTTP status code
        status: u16,
        /// Server message
        message: String,
    },

    /// 5xx response
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server message
        message: String,
    },

    /// Transport failure: connect, timeout, reset
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Client configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),

    /// Same operation already in flight for the same entity
    #[error("{operation} already in progress")]
    AlreadyPending {
        /// Operation that was resubmitted
        operation: Operation,
    },

    /// User declined a confirmation step
    #[error("operation cancelled")]
    Cancelled,
}

impl ForgeError {
    /// Create validation error
    #[inline]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if retrying the same request can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Human-readable message, without the category prefix
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::PayloadTooLarge(m)
            | Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Network(m)
            | Self::Decode(m)
            | Self::Config(m) => m.clone(),
            Self::Client { message, .. } | Self::Server { message, .. } => message.clone(),
            Self::AlreadyPending { .. } | Self::Cancelled => self.to_string(),
        }
    }
}

/// Baseline lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Capture a new baseline
    Create,
    /// Remove a baseline
    Delete,
    /// Make a baseline the project's comparison reference
    Activate,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Activate => "activate",
        })
    }
}
