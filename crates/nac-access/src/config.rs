//! Session engine configuration.

use crate::retry::RetryPolicy;
use chrono::TimeDelta;
use nac_types::AccessRole;

/// Tunables for the session manager.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Session TTL granted on guest connection.
    pub guest_ttl: TimeDelta,
    /// Session TTL granted on authentication as `user`.
    pub user_ttl: TimeDelta,
    /// Session TTL granted on authentication as `admin`.
    pub admin_ttl: TimeDelta,
    /// How long expired records are kept before retention purge.
    pub retention: TimeDelta,
    /// Retry behavior for gateway calls.
    pub retry: RetryPolicy,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            guest_ttl: TimeDelta::minutes(15),
            user_ttl: TimeDelta::hours(8),
            admin_ttl: TimeDelta::hours(24),
            retention: TimeDelta::days(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl AccessConfig {
    /// Returns the TTL granted when a session transitions into `role`.
    pub fn ttl(&self, role: AccessRole) -> TimeDelta {
        match role {
            AccessRole::Guest => self.guest_ttl,
            AccessRole::User => self.user_ttl,
            AccessRole::Admin => self.admin_ttl,
        }
    }

    /// Sets all three TTLs, builder style.
    pub fn with_ttls(mut self, guest: TimeDelta, user: TimeDelta, admin: TimeDelta) -> Self {
        self.guest_ttl = guest;
        self.user_ttl = user;
        self.admin_ttl = admin;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_per_role() {
        let config = AccessConfig::default();
        assert!(config.ttl(AccessRole::Guest) < config.ttl(AccessRole::User));
        assert!(config.ttl(AccessRole::User) < config.ttl(AccessRole::Admin));
    }

    #[test]
    fn test_with_ttls() {
        let config = AccessConfig::default().with_ttls(
            TimeDelta::minutes(1),
            TimeDelta::minutes(2),
            TimeDelta::minutes(3),
        );
        assert_eq!(config.ttl(AccessRole::Guest), TimeDelta::minutes(1));
        assert_eq!(config.ttl(AccessRole::Admin), TimeDelta::minutes(3));
    }
}
