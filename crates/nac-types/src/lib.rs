//! Common types for the bridge network-access control engine.
//!
//! This crate provides the type-safe primitives shared across the engine:
//!
//! - [`MacAddress`]: 48-bit client hardware addresses in canonical form
//! - [`AccessRole`]: the ordered access tier (guest < user < admin)
//! - [`AccessStatus`]: the per-record lifecycle state

mod mac;
mod role;
mod status;

pub use mac::MacAddress;
pub use role::AccessRole;
pub use status::AccessStatus;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("unknown access role: {0}")]
    UnknownRole(String),

    #[error("unknown access status: {0}")]
    UnknownStatus(String),
}
