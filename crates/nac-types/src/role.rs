//! Access role tiers.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An access tier granted to a client MAC.
///
/// Roles form an ordered set: `Guest < User < Admin`. A higher role is a
/// superset of a lower role's permissions, which is what makes role
/// promotion on authentication a pure rule-set replacement rather than a
/// merge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    /// Unauthenticated client: captive-portal and DNS access only.
    #[default]
    Guest,
    /// Authenticated subscriber: general forwarding minus the blocklist.
    User,
    /// Operator: unrestricted forwarding.
    Admin,
}

impl AccessRole {
    /// All roles in ascending privilege order.
    pub const ALL: [AccessRole; 3] = [AccessRole::Guest, AccessRole::User, AccessRole::Admin];

    /// Returns the canonical lower-case name of the role.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessRole::Guest => "guest",
            AccessRole::User => "user",
            AccessRole::Admin => "admin",
        }
    }

    /// Returns true if this role is at least as privileged as `other`.
    pub fn grants(&self, other: AccessRole) -> bool {
        *self >= other
    }
}

impl fmt::Display for AccessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "guest" => Ok(AccessRole::Guest),
            "user" => Ok(AccessRole::User),
            "admin" => Ok(AccessRole::Admin),
            _ => Err(ParseError::UnknownRole(s.to_string())),
        }
    }
}
