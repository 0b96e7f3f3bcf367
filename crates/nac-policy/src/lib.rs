//! Policy compilation for the bridge access control engine.
//!
//! The compiler is the pure core of the engine: given a client MAC and an
//! access role it produces the exact set of filter, NAT, and mangle rule
//! specifications that realize the role on the bridged device. It has no
//! side effects and no dependency on record history, so a role downgrade is
//! computed the same way as a fresh compile.
//!
//! Rule identifiers are content-addressed from `(mac, role, kind)`, which is
//! what makes reconciliation idempotent: recompiling the same pair always
//! names the same rules.

mod compiler;
mod ruleset;

pub use compiler::{PolicyCompiler, PolicyConfig};
pub use ruleset::RuleSet;
