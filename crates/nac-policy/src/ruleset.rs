//! Compiled rule sets.

use nac_gateway::{RuleId, RuleSpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The complete set of rules realizing one (MAC, role) pair, grouped by
/// category in application order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub filters: Vec<RuleSpec>,
    pub nats: Vec<RuleSpec>,
    pub mangles: Vec<RuleSpec>,
}

impl RuleSet {
    /// Iterates all specs in application order (filter, NAT, mangle).
    pub fn iter(&self) -> impl Iterator<Item = &RuleSpec> {
        self.filters
            .iter()
            .chain(self.nats.iter())
            .chain(self.mangles.iter())
    }

    /// Returns the identifiers of every rule in the set.
    pub fn ids(&self) -> BTreeSet<RuleId> {
        self.iter().map(|spec| spec.id.clone()).collect()
    }

    /// Looks up a spec by identifier.
    pub fn get(&self, id: &RuleId) -> Option<&RuleSpec> {
        self.iter().find(|spec| &spec.id == id)
    }

    /// Total number of rules across categories.
    pub fn len(&self) -> usize {
        self.filters.len() + self.nats.len() + self.mangles.len()
    }

    /// Returns true if the set holds no rules.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
