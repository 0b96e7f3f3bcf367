//! Access session engine for the bridge NAC daemon.
//!
//! Tracks one [`AccessRecord`] per client MAC, compiles the record's role to
//! a rule set via `nac-policy`, and keeps the router rule gateway reconciled
//! with that set through the session lifecycle: guest connect, portal
//! authentication, expiry sweep, and retention purge.

pub mod clock;
pub mod config;
pub mod error;
pub mod manager;
pub mod record;
pub mod resolver;
pub mod retry;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AccessConfig;
pub use error::{AccessError, AccessResult};
pub use manager::{AccessStats, AuthOutcome, BridgeRuleCounts, ConnectOutcome, SessionManager};
pub use record::AccessRecord;
pub use resolver::{ResolveError, RoleResolver, StaticResolver};
pub use retry::{retry_gateway, RetryPolicy};
pub use store::{AccessStore, MemoryStore};
