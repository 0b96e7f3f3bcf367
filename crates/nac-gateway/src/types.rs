//! Bridge rule model: categories, identifiers, and per-category payloads.

use nac_types::MacAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddrV4;

/// Rule category on the bridged device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Allow/deny forwarding decisions.
    Filter,
    /// Address/port rewriting (redirect, masquerade).
    Nat,
    /// Packet marking for downstream queueing/shaping.
    Mangle,
}

impl RuleCategory {
    /// All categories, in the order rules are applied.
    pub const ALL: [RuleCategory; 3] = [RuleCategory::Filter, RuleCategory::Nat, RuleCategory::Mangle];

    /// Returns the canonical lower-case name of the category.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Filter => "filter",
            RuleCategory::Nat => "nat",
            RuleCategory::Mangle => "mangle",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque, content-addressed rule identifier.
///
/// The policy compiler derives identifiers deterministically from
/// `(mac, role, rule kind)`, so compiling the same pair twice yields the same
/// ids and applying an already-present id is a no-op on the device. The
/// gateway treats the id as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a rule id from an opaque string.
    pub fn new(id: impl Into<String>) -> Self {
        RuleId(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        RuleId(s.to_string())
    }
}

/// Filter-chain action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    /// Permit traffic to the captive portal (and optionally DNS) only,
    /// dropping everything else from this source.
    RestrictToPortal {
        portal: SocketAddrV4,
        allow_dns: bool,
    },
    /// Permit general forwarding, minus an optional destination blocklist.
    Forward { blocked: Vec<std::net::Ipv4Addr> },
}

/// NAT-chain action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NatAction {
    /// Rewrite all outbound HTTP to the portal login endpoint.
    RedirectHttp { to: SocketAddrV4 },
    /// General source NAT for routed traffic.
    Masquerade,
}

/// Mangle-chain action: tag the connection for bandwidth shaping tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangleAction {
    pub mark: String,
}

/// Category-specific rule payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulePayload {
    Filter(FilterAction),
    Nat(NatAction),
    Mangle(MangleAction),
}

impl RulePayload {
    /// Returns the category this payload belongs to.
    pub const fn category(&self) -> RuleCategory {
        match self {
            RulePayload::Filter(_) => RuleCategory::Filter,
            RulePayload::Nat(_) => RuleCategory::Nat,
            RulePayload::Mangle(_) => RuleCategory::Mangle,
        }
    }
}

/// A complete rule specification as sent to the gateway.
///
/// The `id` is the reconciliation key: a spec with an id already present on
/// the device is considered applied regardless of payload, so callers must
/// derive ids from the payload-determining inputs (which the policy compiler
/// does).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: RuleId,
    /// Source MAC the rule matches on.
    pub src_mac: MacAddress,
    pub payload: RulePayload,
}

impl RuleSpec {
    /// Creates a new rule spec.
    pub fn new(id: RuleId, src_mac: MacAddress, payload: RulePayload) -> Self {
        Self {
            id,
            src_mac,
            payload,
        }
    }

    /// Returns the category of this rule.
    pub fn category(&self) -> RuleCategory {
        self.payload.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn mac() -> MacAddress {
        "00:11:22:33:44:55".parse().unwrap()
    }

    #[test]
    fn test_payload_category() {
        let portal = SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 8080);
        let filter = RulePayload::Filter(FilterAction::RestrictToPortal {
            portal,
            allow_dns: true,
        });
        let nat = RulePayload::Nat(NatAction::Masquerade);
        let mangle = RulePayload::Mangle(MangleAction {
            mark: "guest".to_string(),
        });

        assert_eq!(filter.category(), RuleCategory::Filter);
        assert_eq!(nat.category(), RuleCategory::Nat);
        assert_eq!(mangle.category(), RuleCategory::Mangle);
    }

    #[test]
    fn test_spec_category_follows_payload() {
        let spec = RuleSpec::new(
            RuleId::new("r1"),
            mac(),
            RulePayload::Nat(NatAction::Masquerade),
        );
        assert_eq!(spec.category(), RuleCategory::Nat);
    }

    #[test]
    fn test_category_names() {
        assert_eq!(RuleCategory::Filter.as_str(), "filter");
        assert_eq!(RuleCategory::Nat.as_str(), "nat");
        assert_eq!(RuleCategory::Mangle.as_str(), "mangle");
    }
}
