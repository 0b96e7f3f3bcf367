//! Gateway error types and retryability classification.

use thiserror::Error;

/// Error type for router rule gateway operations.
///
/// The split between [`GatewayError::Unavailable`] / [`GatewayError::Timeout`]
/// (transient, retryable) and [`GatewayError::Rejected`] (the device refused
/// the rule, non-retryable) drives the session manager's retry policy: only
/// retryable errors are re-attempted with backoff, everything else surfaces
/// to the caller immediately.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The device is unreachable or refused the connection.
    #[error("gateway unavailable: {message}")]
    Unavailable { message: String },

    /// The device did not answer within the bounded per-call timeout.
    #[error("gateway call timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// The device refused the rule. Not retryable.
    #[error("gateway rejected rule: {message}")]
    Rejected { message: String },

    /// Internal adapter error.
    #[error("gateway internal error: {message}")]
    Internal { message: String },
}

impl GatewayError {
    /// Creates an unavailable (transient) error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        GatewayError::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(millis: u64) -> Self {
        GatewayError::Timeout { millis }
    }

    /// Creates a rejected (non-retryable) error.
    pub fn rejected(message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        GatewayError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable { .. } | GatewayError::Timeout { .. }
        )
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
