//! Access record lifecycle status.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an access record.
///
/// Records move `Pending -> Active -> Expired`; `Expired` is terminal until
/// the record is garbage-collected by retention cleanup. A `Pending` record
/// is one whose gateway rules are not (fully) applied yet, either because the
/// first connect is still in flight or because a gateway failure left the
/// rule set incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessStatus {
    /// Record exists but its rule set is not fully materialized.
    Pending,
    /// Rules are applied and the session is live.
    Active,
    /// Session expired and all rules have been retracted.
    Expired,
}

impl AccessStatus {
    /// Returns the canonical lower-case name of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Pending => "pending",
            AccessStatus::Active => "active",
            AccessStatus::Expired => "expired",
        }
    }

    /// Returns true for states that count as a live session (pending or
    /// active). At most one live record may exist per MAC.
    pub const fn is_live(&self) -> bool {
        matches!(self, AccessStatus::Pending | AccessStatus::Active)
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(AccessStatus::Pending),
            "active" => Ok(AccessStatus::Active),
            "expired" => Ok(AccessStatus::Expired),
            _ => Err(ParseError::UnknownStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness() {
        assert!(AccessStatus::Pending.is_live());
        assert!(AccessStatus::Active.is_live());
        assert!(!AccessStatus::Expired.is_live());
    }

    #[test]
    fn test_parse_roundtrip() {
        for status in [
            AccessStatus::Pending,
            AccessStatus::Active,
            AccessStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<AccessStatus>().unwrap(), status);
        }
        assert!("gone".parse::<AccessStatus>().is_err());
    }
}
