//! The access store: persisted per-MAC records.

use crate::record::AccessRecord;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nac_types::MacAddress;

/// Storage for access records, keyed by MAC.
///
/// The store is the only shared mutable resource in the engine. It provides
/// single-record consistency (each call observes or replaces a whole
/// record); cross-record atomicity is the session manager's job via its
/// per-MAC locks. Lookups never create records.
pub trait AccessStore: Send + Sync {
    /// Returns a snapshot of the record for a MAC, if present.
    fn get(&self, mac: &MacAddress) -> Option<AccessRecord>;

    /// Inserts or replaces the record for its MAC.
    fn upsert(&self, record: AccessRecord);

    /// Removes the record for a MAC, returning it if present.
    fn remove(&self, mac: &MacAddress) -> Option<AccessRecord>;

    /// Returns a snapshot of every record.
    fn scan(&self) -> Vec<AccessRecord>;

    /// Number of records held.
    fn len(&self) -> usize;

    /// Returns true if the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retention cleanup: deletes expired records whose sessions ended
    /// before `before`. Only records with an empty applied-rule set are
    /// eligible; anything still holding rules belongs to the sweep.
    fn purge_expired(&self, before: DateTime<Utc>) -> usize;
}

/// In-memory [`AccessStore`] over a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<MacAddress, AccessRecord>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccessStore for MemoryStore {
    fn get(&self, mac: &MacAddress) -> Option<AccessRecord> {
        self.records.get(mac).map(|r| r.clone())
    }

    fn upsert(&self, record: AccessRecord) {
        self.records.insert(record.mac, record);
    }

    fn remove(&self, mac: &MacAddress) -> Option<AccessRecord> {
        self.records.remove(mac).map(|(_, r)| r)
    }

    fn scan(&self) -> Vec<AccessRecord> {
        self.records.iter().map(|r| r.clone()).collect()
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn purge_expired(&self, before: DateTime<Utc>) -> usize {
        let initial = self.records.len();
        self.records.retain(|_, rec| {
            !(rec.status == nac_types::AccessStatus::Expired
                && rec.applied_rule_ids.is_empty()
                && rec.expires_at < before)
        });
        initial - self.records.len()
    }
}
