//! Command security gate.
//!
//! # Data Flow
//! ```text
//! Action (caller, command, guild, payload):
//!     → anti_raid lockdown?        → Locked
//!     → rate_limit global          → RateLimited { GLOBAL }
//!     → rate_limit per action      → RateLimited { action, retry hint }
//!     → privileged and not admin   → Unauthorized
//!     → field rules (validation)   → ValidationRejected
//!     → Allowed
//! ```
//!
//! Every denial is audited before the verdict is returned. The gate never
//! returns an error: a verdict is always produced.

pub mod action;
pub mod admin;
pub mod security_gate;
pub mod verdict;

pub use action::Action;
pub use admin::{AdminCommand, AdminOutcome};
pub use security_gate::SecurityGate;
pub use verdict::{Denial, Verdict};
