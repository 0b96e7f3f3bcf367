//! Per-MAC access records.

use chrono::{DateTime, Utc};
use nac_gateway::RuleId;
use nac_types::{AccessRole, AccessStatus, MacAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One client session: the authoritative record of what a MAC is entitled to
/// and which rules are currently materialized for it on the gateway.
///
/// `applied_rule_ids` tracks the gateway image precisely, including mid-flight
/// partial states, so a failed transition is always resumable: whatever subset
/// of rules did apply is recorded before the error surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub mac: MacAddress,
    pub username: Option<String>,
    pub role: AccessRole,
    pub status: AccessStatus,
    pub created_at: DateTime<Utc>,
    pub authenticated_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub applied_rule_ids: BTreeSet<RuleId>,
}

impl AccessRecord {
    /// Creates a fresh pending record for a newly observed MAC.
    ///
    /// `expires_at` starts at `now`; the session manager raises it via
    /// [`extend_expiry`](Self::extend_expiry) once the rule set is applied.
    pub fn new(mac: MacAddress, role: AccessRole, now: DateTime<Utc>) -> Self {
        Self {
            mac,
            username: None,
            role,
            status: AccessStatus::Pending,
            created_at: now,
            authenticated_at: None,
            expires_at: now,
            applied_rule_ids: BTreeSet::new(),
        }
    }

    /// Returns true if the record is live (pending or active).
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Returns true if the session deadline has passed.
    ///
    /// A live record past its deadline is "lazily expired": the sweep has
    /// not retired it yet, but statistics already exclude it from the
    /// active count.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns true if this record counts as active right now.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == AccessStatus::Active && !self.is_expired(now)
    }

    /// Raises the expiry deadline to `until` if that is later than the
    /// current deadline. The deadline never moves backward.
    pub fn extend_expiry(&mut self, until: DateTime<Utc>) {
        if until > self.expires_at {
            self.expires_at = until;
        }
    }

    /// Marks the record expired. Only valid once every gateway rule has
    /// been retracted; callers must clear `applied_rule_ids` first.
    pub fn mark_expired(&mut self) {
        debug_assert!(self.applied_rule_ids.is_empty());
        self.status = AccessStatus::Expired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn mac() -> MacAddress {
        "00:11:22:33:44:55".parse().unwrap()
    }

    #[test]
    fn test_new_record_is_pending() {
        let now = Utc::now();
        let rec = AccessRecord::new(mac(), AccessRole::Guest, now);
        assert_eq!(rec.status, AccessStatus::Pending);
        assert!(rec.is_live());
        assert!(rec.applied_rule_ids.is_empty());
        assert_eq!(rec.expires_at, now);
    }

    #[test]
    fn test_expiry_never_moves_backward() {
        let now = Utc::now();
        let mut rec = AccessRecord::new(mac(), AccessRole::Guest, now);

        let later = now + TimeDelta::minutes(30);
        rec.extend_expiry(later);
        assert_eq!(rec.expires_at, later);

        // A shorter TTL (e.g. downgrade) must not shorten the session.
        rec.extend_expiry(now + TimeDelta::minutes(5));
        assert_eq!(rec.expires_at, later);
    }

    #[test]
    fn test_lazy_expiry() {
        let now = Utc::now();
        let mut rec = AccessRecord::new(mac(), AccessRole::Guest, now);
        rec.status = AccessStatus::Active;
        rec.extend_expiry(now + TimeDelta::minutes(30));

        assert!(rec.is_active(now));
        let later = now + TimeDelta::minutes(31);
        assert!(!rec.is_active(later));
        assert!(rec.is_expired(later));
        // Still live until the sweep retires it.
        assert!(rec.is_live());
    }
}
