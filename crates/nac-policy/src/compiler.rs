//! The (MAC, role) -> rule set compiler.

use crate::ruleset::RuleSet;
use nac_gateway::{FilterAction, MangleAction, NatAction, RuleId, RulePayload, RuleSpec};
use nac_types::{AccessRole, MacAddress};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddrV4};

/// Static policy inputs: where the captive portal lives and how each role's
/// traffic is marked and restricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Captive portal login endpoint; guest HTTP is redirected here and
    /// guest filters permit only this destination (plus DNS).
    pub portal: SocketAddrV4,
    /// Whether guests may resolve DNS before authenticating. Required for
    /// HTTP-redirect captive portals to work at all, but switchable for
    /// DNS-rewriting deployments.
    pub allow_guest_dns: bool,
    /// Administrator-defined destination blocklist applied to `user` role
    /// forwarding. Admins bypass it.
    pub blocklist: Vec<Ipv4Addr>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            portal: SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 8080),
            allow_guest_dns: true,
            blocklist: Vec::new(),
        }
    }
}

impl PolicyConfig {
    /// Sets the portal endpoint.
    pub fn with_portal(mut self, portal: SocketAddrV4) -> Self {
        self.portal = portal;
        self
    }

    /// Sets the user-role destination blocklist.
    pub fn with_blocklist(mut self, blocklist: Vec<Ipv4Addr>) -> Self {
        self.blocklist = blocklist;
        self
    }
}

/// Pure compiler mapping `(mac, role)` to the concrete rule set.
///
/// Deterministic: the same inputs always yield the same specs with the same
/// content-addressed identifiers, so the session manager can diff compiled
/// sets across transitions and issue only the minimal gateway operations.
#[derive(Debug, Clone, Default)]
pub struct PolicyCompiler {
    config: PolicyConfig,
}

impl PolicyCompiler {
    /// Creates a compiler over the given policy configuration.
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Returns the policy configuration.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Derives the content-addressed identifier for one rule of a pair.
    ///
    /// Format: `<mac>/<role>/<kind>`, e.g.
    /// `00:11:22:33:44:55/guest/http-redirect`.
    fn rule_id(mac: MacAddress, role: AccessRole, kind: &str) -> RuleId {
        RuleId::new(format!("{mac}/{role}/{kind}"))
    }

    /// Compiles the full rule set for a (MAC, role) pair.
    ///
    /// Every role maps to exactly one filter, one NAT, and one mangle rule;
    /// the rules differ per role, and their ids embed the role, so a role
    /// change always replaces the whole trio.
    pub fn compile(&self, mac: MacAddress, role: AccessRole) -> RuleSet {
        let (filter, nat) = match role {
            AccessRole::Guest => (
                FilterAction::RestrictToPortal {
                    portal: self.config.portal,
                    allow_dns: self.config.allow_guest_dns,
                },
                NatAction::RedirectHttp {
                    to: self.config.portal,
                },
            ),
            AccessRole::User => (
                FilterAction::Forward {
                    blocked: self.config.blocklist.clone(),
                },
                NatAction::Masquerade,
            ),
            AccessRole::Admin => (
                // Admins bypass the blocklist.
                FilterAction::Forward { blocked: Vec::new() },
                NatAction::Masquerade,
            ),
        };

        let filter_kind = match role {
            AccessRole::Guest => "portal-restrict",
            AccessRole::User | AccessRole::Admin => "forward",
        };
        let nat_kind = match role {
            AccessRole::Guest => "http-redirect",
            AccessRole::User | AccessRole::Admin => "masquerade",
        };

        RuleSet {
            filters: vec![RuleSpec::new(
                Self::rule_id(mac, role, filter_kind),
                mac,
                RulePayload::Filter(filter),
            )],
            nats: vec![RuleSpec::new(
                Self::rule_id(mac, role, nat_kind),
                mac,
                RulePayload::Nat(nat),
            )],
            mangles: vec![RuleSpec::new(
                Self::rule_id(mac, role, "shaping-mark"),
                mac,
                RulePayload::Mangle(MangleAction {
                    mark: role.as_str().to_string(),
                }),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mac() -> MacAddress {
        "00:11:22:33:44:55".parse().unwrap()
    }

    fn compiler() -> PolicyCompiler {
        PolicyCompiler::new(
            PolicyConfig::default()
                .with_portal(SocketAddrV4::new(Ipv4Addr::new(192, 168, 88, 1), 8080))
                .with_blocklist(vec![Ipv4Addr::new(203, 0, 113, 9)]),
        )
    }

    #[test]
    fn test_compile_is_deterministic() {
        let c = compiler();
        let first = c.compile(mac(), AccessRole::Guest);
        let second = c.compile(mac(), AccessRole::Guest);
        assert_eq!(first, second);
        assert_eq!(first.ids(), second.ids());
    }

    #[test]
    fn test_guest_rules() {
        let set = compiler().compile(mac(), AccessRole::Guest);
        assert_eq!(set.filters.len(), 1);
        assert_eq!(set.nats.len(), 1);
        assert_eq!(set.mangles.len(), 1);

        match &set.filters[0].payload {
            RulePayload::Filter(FilterAction::RestrictToPortal { portal, allow_dns }) => {
                assert_eq!(portal.port(), 8080);
                assert!(allow_dns);
            }
            other => panic!("unexpected filter payload: {other:?}"),
        }
        match &set.nats[0].payload {
            RulePayload::Nat(NatAction::RedirectHttp { to }) => {
                assert_eq!(*to.ip(), Ipv4Addr::new(192, 168, 88, 1));
            }
            other => panic!("unexpected nat payload: {other:?}"),
        }
        match &set.mangles[0].payload {
            RulePayload::Mangle(m) => assert_eq!(m.mark, "guest"),
            other => panic!("unexpected mangle payload: {other:?}"),
        }
    }

    #[test]
    fn test_user_rules_carry_blocklist() {
        let set = compiler().compile(mac(), AccessRole::User);
        match &set.filters[0].payload {
            RulePayload::Filter(FilterAction::Forward { blocked }) => {
                assert_eq!(blocked, &vec![Ipv4Addr::new(203, 0, 113, 9)]);
            }
            other => panic!("unexpected filter payload: {other:?}"),
        }
        assert!(matches!(
            set.nats[0].payload,
            RulePayload::Nat(NatAction::Masquerade)
        ));
    }

    #[test]
    fn test_admin_bypasses_blocklist() {
        let set = compiler().compile(mac(), AccessRole::Admin);
        match &set.filters[0].payload {
            RulePayload::Filter(FilterAction::Forward { blocked }) => {
                assert!(blocked.is_empty());
            }
            other => panic!("unexpected filter payload: {other:?}"),
        }
    }

    #[test]
    fn test_role_change_replaces_every_id() {
        let c = compiler();
        let guest = c.compile(mac(), AccessRole::Guest).ids();
        let user = c.compile(mac(), AccessRole::User).ids();
        assert!(guest.is_disjoint(&user));
    }

    #[test]
    fn test_ids_embed_mac_and_role() {
        let set = compiler().compile(mac(), AccessRole::Guest);
        for id in set.ids() {
            assert!(id.as_str().starts_with("00:11:22:33:44:55/guest/"));
        }
    }

    #[test]
    fn test_different_macs_never_collide() {
        let c = compiler();
        let a = c.compile(mac(), AccessRole::Guest).ids();
        let b = c
            .compile("66:77:88:99:aa:bb".parse().unwrap(), AccessRole::Guest)
            .ids();
        assert!(a.is_disjoint(&b));
    }

    #[test]
    fn test_downgrade_equals_fresh_compile() {
        let c = compiler();
        // A downgrade back to guest needs no history: it is the same compile.
        let fresh = c.compile(mac(), AccessRole::Guest);
        let downgraded = c.compile(mac(), AccessRole::Guest);
        assert_eq!(fresh, downgraded);
    }
}
