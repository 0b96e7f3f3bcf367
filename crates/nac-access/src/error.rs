//! Session engine error types.

use crate::resolver::ResolveError;
use nac_gateway::GatewayError;
use nac_types::MacAddress;
use thiserror::Error;

/// Error type for session manager operations.
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// The MAC address is malformed or cannot identify a client.
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),

    /// Authentication was attempted against a MAC with no live session.
    #[error("no session for {0}")]
    RecordNotFound(MacAddress),

    /// The supplied credential did not check out.
    #[error("invalid credential")]
    InvalidCredential,

    /// The external role resolver could not be reached.
    #[error("role resolver unavailable: {0}")]
    ResolverUnavailable(String),

    /// A gateway operation failed after exhausting retries.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AccessError {
    /// Returns true if a later retry of the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AccessError::Gateway(e) => e.is_retryable(),
            AccessError::ResolverUnavailable(_) => true,
            _ => false,
        }
    }
}

impl From<ResolveError> for AccessError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidCredential => AccessError::InvalidCredential,
            ResolveError::Unavailable(message) => AccessError::ResolverUnavailable(message),
        }
    }
}

/// Result type for session manager operations.
pub type AccessResult<T> = Result<T, AccessError>;
