//! The device trait implemented by rule gateway adapters.

use crate::error::GatewayResult;
use crate::types::{RuleCategory, RuleId, RuleSpec};
use async_trait::async_trait;

/// Idempotent rule CRUD against the bridged device.
///
/// # Contract
///
/// Every adapter (real device client or test double) must uphold:
///
/// - `apply` with a rule id already present on the device is a no-op
///   success, never a duplicate. Rules are unique by identifier.
/// - `retract` of an id that is not present is a no-op success, so a
///   partially-failed sweep can be re-run safely.
/// - `list` reports the ids actually held by the device per category; the
///   engine trusts this over any internal counter.
///
/// Calls may block on network I/O and can fail transiently; callers bound
/// each call with a timeout and treat a timeout as failure, never success.
#[async_trait]
pub trait RuleGateway: Send + Sync {
    /// Materializes a rule on the device. Returns the rule's identifier.
    async fn apply(&self, spec: &RuleSpec) -> GatewayResult<RuleId>;

    /// Removes a rule from the device by identifier.
    async fn retract(&self, id: &RuleId) -> GatewayResult<()>;

    /// Lists all rule identifiers currently held in a category.
    async fn list(&self, category: RuleCategory) -> GatewayResult<Vec<RuleId>>;
}
