//! In-memory rule gateway double.

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::RuleGateway;
use crate::types::{RuleCategory, RuleId, RuleSpec};
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// An in-memory [`RuleGateway`] with the same idempotency and
/// uniqueness-by-identifier contract as a real device adapter.
///
/// Used by the behavioral test suite and by the daemon when no device is
/// attached. Fault injection lets tests exercise the transient-failure
/// paths: [`fail_next`](MemoryGateway::fail_next) makes the next N calls
/// fail with a retryable error, [`set_unavailable`](MemoryGateway::set_unavailable)
/// fails every call until cleared.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    rules: DashMap<RuleId, RuleSpec>,
    failures_remaining: AtomicU32,
    unavailable: AtomicBool,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` gateway calls fail with a retryable error.
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Marks the device unreachable (or reachable again).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Returns the number of rules currently held, across all categories.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if a rule with this id is present.
    pub fn contains(&self, id: &RuleId) -> bool {
        self.rules.contains_key(id)
    }

    /// Returns the stored spec for an id, if present.
    pub fn get(&self, id: &RuleId) -> Option<RuleSpec> {
        self.rules.get(id).map(|r| r.clone())
    }

    fn check_faults(&self) -> GatewayResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::unavailable("device unreachable"));
        }
        let prev = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .unwrap_or(0);
        if prev > 0 {
            return Err(GatewayError::unavailable("injected transient failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RuleGateway for MemoryGateway {
    async fn apply(&self, spec: &RuleSpec) -> GatewayResult<RuleId> {
        self.check_faults()?;

        // Idempotent: an existing id is a no-op success.
        if self.rules.contains_key(&spec.id) {
            debug!("apply {}: already present, no-op", spec.id);
            return Ok(spec.id.clone());
        }

        debug!("apply {} ({})", spec.id, spec.category());
        self.rules.insert(spec.id.clone(), spec.clone());
        Ok(spec.id.clone())
    }

    async fn retract(&self, id: &RuleId) -> GatewayResult<()> {
        self.check_faults()?;

        if self.rules.remove(id).is_some() {
            debug!("retract {}", id);
        } else {
            debug!("retract {}: not present, no-op", id);
        }
        Ok(())
    }

    async fn list(&self, category: RuleCategory) -> GatewayResult<Vec<RuleId>> {
        self.check_faults()?;

        let mut ids: Vec<RuleId> = self
            .rules
            .iter()
            .filter(|r| r.category() == category)
            .map(|r| r.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MangleAction, NatAction, RulePayload};
    use nac_types::MacAddress;
    use pretty_assertions::assert_eq;

    fn mac() -> MacAddress {
        "00:11:22:33:44:55".parse().unwrap()
    }

    fn nat_spec(id: &str) -> RuleSpec {
        RuleSpec::new(RuleId::new(id), mac(), RulePayload::Nat(NatAction::Masquerade))
    }

    fn mangle_spec(id: &str, mark: &str) -> RuleSpec {
        RuleSpec::new(
            RuleId::new(id),
            mac(),
            RulePayload::Mangle(MangleAction {
                mark: mark.to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() {
        let gw = MemoryGateway::new();
        let spec = nat_spec("n1");

        let id1 = gw.apply(&spec).await.unwrap();
        let id2 = gw.apply(&spec).await.unwrap();

        assert_eq!(id1, id2);
        assert_eq!(gw.rule_count(), 1);
    }

    #[tokio::test]
    async fn test_retract_missing_is_noop() {
        let gw = MemoryGateway::new();
        gw.retract(&RuleId::new("ghost")).await.unwrap();

        gw.apply(&nat_spec("n1")).await.unwrap();
        gw.retract(&RuleId::new("n1")).await.unwrap();
        gw.retract(&RuleId::new("n1")).await.unwrap();
        assert_eq!(gw.rule_count(), 0);
    }

    #[tokio::test]
    async fn test_list_per_category() {
        let gw = MemoryGateway::new();
        gw.apply(&nat_spec("n1")).await.unwrap();
        gw.apply(&mangle_spec("m1", "guest")).await.unwrap();
        gw.apply(&mangle_spec("m2", "user")).await.unwrap();

        let nats = gw.list(RuleCategory::Nat).await.unwrap();
        let mangles = gw.list(RuleCategory::Mangle).await.unwrap();
        let filters = gw.list(RuleCategory::Filter).await.unwrap();

        assert_eq!(nats, vec![RuleId::new("n1")]);
        assert_eq!(mangles, vec![RuleId::new("m1"), RuleId::new("m2")]);
        assert!(filters.is_empty());
    }

    #[tokio::test]
    async fn test_fail_next_injects_transient_errors() {
        let gw = MemoryGateway::new();
        gw.fail_next(2);

        let err = gw.apply(&nat_spec("n1")).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(gw.retract(&RuleId::new("n1")).await.is_err());

        // Third call succeeds.
        gw.apply(&nat_spec("n1")).await.unwrap();
        assert_eq!(gw.rule_count(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_fails_everything_until_cleared() {
        let gw = MemoryGateway::new();
        gw.set_unavailable(true);

        assert!(gw.apply(&nat_spec("n1")).await.is_err());
        assert!(gw.list(RuleCategory::Nat).await.is_err());

        gw.set_unavailable(false);
        gw.apply(&nat_spec("n1")).await.unwrap();
    }
}
