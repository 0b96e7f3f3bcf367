//! The access session manager.
//!
//! Owns the per-MAC record lifecycle: creation on first connection,
//! promotion on authentication, periodic expiry sweep, and reconciliation of
//! each record's rule set against the router rule gateway.

use crate::clock::Clock;
use crate::config::AccessConfig;
use crate::error::{AccessError, AccessResult};
use crate::record::AccessRecord;
use crate::resolver::RoleResolver;
use crate::retry::retry_gateway;
use crate::store::AccessStore;
use dashmap::DashMap;
use log::{debug, info, warn};
use nac_gateway::{RuleCategory, RuleGateway, RuleId};
use nac_policy::{PolicyCompiler, RuleSet};
use nac_types::{AccessRole, AccessStatus, MacAddress};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a connect call: the role granted and the rule ids realizing it,
/// grouped by category for caller visibility.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectOutcome {
    pub mac: MacAddress,
    pub role: AccessRole,
    pub filter_rules: Vec<RuleId>,
    pub nat_rules: Vec<RuleId>,
    pub mangle_rules: Vec<RuleId>,
}

/// Result of a successful authentication.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    pub role: AccessRole,
    pub message: String,
}

/// Gateway rule-table sizes per category, as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeRuleCounts {
    pub filters: usize,
    pub nat: usize,
    pub mangle: usize,
}

/// Read-only aggregation over the access store and the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct AccessStats {
    pub total_access: usize,
    pub active_access: usize,
    pub expired_access: usize,
    pub users_by_role: BTreeMap<String, usize>,
    pub bridge_rules: BridgeRuleCounts,
}

/// The per-MAC access state machine.
///
/// All transitions for one MAC are serialized through a per-MAC async mutex;
/// operations on different MACs run fully in parallel. Gateway calls happen
/// under the MAC lock so no concurrent caller for the same MAC can observe a
/// half-applied rule set, and `applied_rule_ids` is persisted before any
/// gateway error surfaces, keeping every failure resumable.
pub struct SessionManager {
    store: Arc<dyn AccessStore>,
    gateway: Arc<dyn RuleGateway>,
    resolver: Arc<dyn RoleResolver>,
    compiler: PolicyCompiler,
    clock: Arc<dyn Clock>,
    config: AccessConfig,
    locks: DashMap<MacAddress, Arc<Mutex<()>>>,
}

impl SessionManager {
    /// Creates a session manager over its collaborators.
    pub fn new(
        store: Arc<dyn AccessStore>,
        gateway: Arc<dyn RuleGateway>,
        resolver: Arc<dyn RoleResolver>,
        compiler: PolicyCompiler,
        clock: Arc<dyn Clock>,
        config: AccessConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            resolver,
            compiler,
            clock,
            config,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, mac: MacAddress) -> Arc<Mutex<()>> {
        self.locks.entry(mac).or_default().clone()
    }

    fn outcome(mac: MacAddress, role: AccessRole, rules: &RuleSet) -> ConnectOutcome {
        ConnectOutcome {
            mac,
            role,
            filter_rules: rules.filters.iter().map(|s| s.id.clone()).collect(),
            nat_rules: rules.nats.iter().map(|s| s.id.clone()).collect(),
            mangle_rules: rules.mangles.iter().map(|s| s.id.clone()).collect(),
        }
    }

    /// Handles a MAC appearing on the bridge.
    ///
    /// Creates a pending record (or reuses the live one), reconciles the
    /// gateway to the role's rule set, and activates the session. With no
    /// explicit role an existing session keeps its current role, so the
    /// routine re-announcement of an authenticated client only refreshes its
    /// deadline; a fresh MAC starts as guest. An explicit role is honored in
    /// both directions, including a deliberate downgrade.
    pub async fn connect(
        &self,
        mac: MacAddress,
        username: Option<String>,
        role: Option<AccessRole>,
    ) -> AccessResult<ConnectOutcome> {
        if !mac.is_client() {
            return Err(AccessError::InvalidMac(mac.to_string()));
        }

        let lock = self.lock_for(mac);
        let _guard = lock.lock().await;
        let now = self.clock.now();

        // At most one live record per MAC: reuse it if present. A swept
        // (expired) record is replaced by a fresh one.
        let (mut rec, role) = match self.store.get(&mac) {
            Some(prev) if prev.is_live() => {
                let role = role.unwrap_or(prev.role);
                (prev, role)
            }
            _ => {
                let role = role.unwrap_or_default();
                (AccessRecord::new(mac, role, now), role)
            }
        };
        if username.is_some() {
            rec.username = username;
        }

        let desired = self.compiler.compile(mac, role);

        if rec.status == AccessStatus::Active && rec.applied_rule_ids == desired.ids() {
            // Idempotent reconnect: nothing to re-apply, refresh the deadline.
            rec.extend_expiry(now + self.config.ttl(role));
            self.store.upsert(rec);
            debug!("{mac}: reconnect as {role}, deadline refreshed");
            return Ok(Self::outcome(mac, role, &desired));
        }

        self.reconcile(&mut rec, &desired).await?;
        rec.role = role;
        rec.status = AccessStatus::Active;
        rec.extend_expiry(now + self.config.ttl(role));
        self.store.upsert(rec);
        info!("{mac}: connected as {role}, {} rules applied", desired.len());

        Ok(Self::outcome(mac, role, &desired))
    }

    /// Handles a portal login for an already-connected MAC.
    ///
    /// Resolves the credential to a role (clamped to at least `user`),
    /// reconciles the gateway from the old rule set to the new one, and
    /// extends the session with the new role's TTL.
    pub async fn authenticate(
        &self,
        mac: MacAddress,
        username: &str,
        credential: &str,
    ) -> AccessResult<AuthOutcome> {
        if !mac.is_client() {
            return Err(AccessError::InvalidMac(mac.to_string()));
        }

        let lock = self.lock_for(mac);
        let _guard = lock.lock().await;
        let now = self.clock.now();

        // A lazily-expired record is not a session: the client reconnects
        // first, it does not log in to a dead lease.
        let mut rec = match self.store.get(&mac) {
            Some(r) if r.is_live() && !r.is_expired(now) => r,
            _ => return Err(AccessError::RecordNotFound(mac)),
        };

        let resolved = self.resolver.resolve(username, credential).await?;
        let role = resolved.max(AccessRole::User);

        let desired = self.compiler.compile(mac, role);
        self.reconcile(&mut rec, &desired).await?;

        rec.username = Some(username.to_string());
        rec.role = role;
        rec.status = AccessStatus::Active;
        rec.authenticated_at = Some(now);
        rec.extend_expiry(now + self.config.ttl(role));
        self.store.upsert(rec);
        info!("{mac}: {username} authenticated, role {role}");

        Ok(AuthOutcome {
            role,
            message: format!("{username} authenticated as {role}"),
        })
    }

    /// Drives `rec.applied_rule_ids` to exactly the desired set, issuing the
    /// minimal gateway operations.
    ///
    /// New rules are applied before stale ones are retracted so a promotion
    /// never leaves the MAC without rules. On gateway failure the record is
    /// rolled back to pending with the subset that did apply recorded
    /// accurately, then the error surfaces; a later connect resumes from
    /// that subset.
    async fn reconcile(&self, rec: &mut AccessRecord, desired: &RuleSet) -> AccessResult<()> {
        let desired_ids = desired.ids();

        for spec in desired.iter() {
            if rec.applied_rule_ids.contains(&spec.id) {
                continue;
            }
            match retry_gateway(&self.config.retry, || self.gateway.apply(spec)).await {
                Ok(id) => {
                    debug!("{}: applied {} ({})", rec.mac, id, spec.category());
                    rec.applied_rule_ids.insert(id);
                }
                Err(err) => {
                    warn!("{}: apply {} failed: {err}", rec.mac, spec.id);
                    rec.status = AccessStatus::Pending;
                    self.store.upsert(rec.clone());
                    return Err(err.into());
                }
            }
        }

        let stale: Vec<RuleId> = rec
            .applied_rule_ids
            .difference(&desired_ids)
            .cloned()
            .collect();
        for id in stale {
            match retry_gateway(&self.config.retry, || self.gateway.retract(&id)).await {
                Ok(()) => {
                    debug!("{}: retracted {id}", rec.mac);
                    rec.applied_rule_ids.remove(&id);
                }
                Err(err) => {
                    warn!("{}: retract {id} failed: {err}", rec.mac);
                    rec.status = AccessStatus::Pending;
                    self.store.upsert(rec.clone());
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }

    /// Expiry sweep: retires every live record whose deadline has passed.
    ///
    /// Each record's rules are retracted before it is marked expired; if a
    /// retraction fails the remaining ids stay recorded and the record stays
    /// live for the next sweep (statistics already exclude it from the
    /// active count). Returns the number of records retired.
    pub async fn sweep(&self) -> usize {
        let now = self.clock.now();
        let candidates: Vec<MacAddress> = self
            .store
            .scan()
            .into_iter()
            .filter(|r| r.is_live() && r.is_expired(now))
            .map(|r| r.mac)
            .collect();

        let mut swept = 0;
        for mac in candidates {
            let lock = self.lock_for(mac);
            let _guard = lock.lock().await;

            // Re-check under the lock: a concurrent connect or login may
            // have extended the session since the scan.
            let Some(mut rec) = self.store.get(&mac) else {
                continue;
            };
            if !rec.is_live() || !rec.is_expired(self.clock.now()) {
                continue;
            }

            let ids: Vec<RuleId> = rec.applied_rule_ids.iter().cloned().collect();
            let mut retract_failed = false;
            for id in &ids {
                match retry_gateway(&self.config.retry, || self.gateway.retract(id)).await {
                    Ok(()) => {
                        rec.applied_rule_ids.remove(id);
                    }
                    Err(err) => {
                        warn!("{mac}: sweep could not retract {id}: {err}");
                        retract_failed = true;
                        break;
                    }
                }
            }

            if !retract_failed {
                rec.mark_expired();
                swept += 1;
                info!("{mac}: session expired, {} rules retracted", ids.len());
            }
            self.store.upsert(rec);
        }

        if swept > 0 {
            info!("sweep retired {swept} sessions");
        }
        swept
    }

    /// Retention cleanup: deletes expired records older than the configured
    /// retention window. Returns the number of records deleted.
    pub fn purge_expired(&self) -> usize {
        let before = self.clock.now() - self.config.retention;
        let purged = self.store.purge_expired(before);
        if purged > 0 {
            info!("retention purge removed {purged} records");
        }

        // Drop lock entries for MACs with no record left. An entry that is
        // held, or whose Arc a concurrent caller already cloned, stays.
        self.locks.retain(|mac, lock| {
            self.store.get(mac).is_some()
                || Arc::strong_count(lock) > 1
                || lock.try_lock().is_err()
        });

        purged
    }

    /// Read-only statistics snapshot.
    ///
    /// The active count excludes lazily-expired records even before the
    /// sweep retires them. Gateway rule counts come from the device's own
    /// `list`, never from an internal counter, so recorded and actual state
    /// cannot drift apart silently.
    pub async fn stats(&self) -> AccessResult<AccessStats> {
        let now = self.clock.now();
        let records = self.store.scan();

        let total_access = records.len();
        let mut active_access = 0;
        let mut expired_access = 0;
        let mut users_by_role: BTreeMap<String, usize> = BTreeMap::new();

        for rec in &records {
            if rec.is_active(now) {
                active_access += 1;
                *users_by_role.entry(rec.role.as_str().to_string()).or_default() += 1;
            } else if rec.status == AccessStatus::Expired || rec.is_expired(now) {
                expired_access += 1;
            }
        }

        let bridge_rules = BridgeRuleCounts {
            filters: self.gateway.list(RuleCategory::Filter).await?.len(),
            nat: self.gateway.list(RuleCategory::Nat).await?.len(),
            mangle: self.gateway.list(RuleCategory::Mangle).await?.len(),
        };

        Ok(AccessStats {
            total_access,
            active_access,
            expired_access,
            users_by_role,
            bridge_rules,
        })
    }
}
