//! Router Rule Gateway boundary for the bridge access control engine.
//!
//! The gateway is the device that actually holds the bridge filter, NAT, and
//! mangle rules (a Mikrotik-style router in production). The engine treats it
//! as an external collaborator exposing idempotent rule CRUD keyed by an
//! opaque [`RuleId`]:
//!
//! - [`RuleGateway`]: the async device trait (`apply` / `retract` / `list`)
//! - [`RuleSpec`] / [`RulePayload`]: the typed rule model per category
//! - [`GatewayError`]: structured failures with retryability classification
//! - [`MemoryGateway`]: the in-memory double enforcing the same contract,
//!   used by tests and the daemon's simulation mode

mod error;
mod gateway;
mod memory;
mod types;

pub use error::{GatewayError, GatewayResult};
pub use gateway::RuleGateway;
pub use memory::MemoryGateway;
pub use types::{FilterAction, MangleAction, NatAction, RuleCategory, RuleId, RulePayload, RuleSpec};
