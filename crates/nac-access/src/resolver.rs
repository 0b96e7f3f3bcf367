//! Role resolution on authentication.
//!
//! How a credential maps to a role is deployment-specific (subscriber table,
//! RADIUS, LDAP), so the engine treats it as an external collaborator behind
//! the [`RoleResolver`] trait. [`StaticResolver`] is the in-tree lookup-table
//! implementation used by tests and the daemon's default configuration.

use async_trait::async_trait;
use nac_types::AccessRole;
use std::collections::HashMap;
use thiserror::Error;

/// Error type for role resolution.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// The credential did not match the identity.
    #[error("invalid credential")]
    InvalidCredential,

    /// The backing identity service could not be reached.
    #[error("resolver unavailable: {0}")]
    Unavailable(String),
}

/// Maps an authenticated identity to its access role.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Verifies `credential` for `username` and returns the account's role.
    async fn resolve(&self, username: &str, credential: &str) -> Result<AccessRole, ResolveError>;
}

/// Fixed user table resolver.
#[derive(Debug, Default)]
pub struct StaticResolver {
    users: HashMap<String, (String, AccessRole)>,
}

impl StaticResolver {
    /// Creates an empty resolver (every login fails).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user entry, builder style.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        role: AccessRole,
    ) -> Self {
        self.users
            .insert(username.into(), (password.into(), role));
        self
    }
}

#[async_trait]
impl RoleResolver for StaticResolver {
    async fn resolve(&self, username: &str, credential: &str) -> Result<AccessRole, ResolveError> {
        match self.users.get(username) {
            Some((password, role)) if password == credential => Ok(*role),
            _ => Err(ResolveError::InvalidCredential),
        }
    }
}
