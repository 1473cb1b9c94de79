//! Anti-raid subsystem.
//!
//! # Data Flow
//! ```text
//! Member join:
//!     → joins.rs (per-guild sliding window, threshold test)
//!     → raid suspected → lockdown.rs (Unlocked → Locked, timer armed)
//!
//! Chat message:
//!     → spam.rs (per-user-per-guild window of content hashes)
//!
//! Command:
//!     → lockdown.rs (is the guild locked?)
//! ```
//!
//! # Design Decisions
//! - Detectors are plain threshold tests on sliding windows; no adaptive
//!   thresholds, no backoff
//! - False positives degrade to a denial and a log line, never a failure
//! - Lockdown is binary and always bounded in time

pub mod joins;
pub mod lockdown;
pub mod spam;
pub mod tracker;
pub mod usernames;

pub use joins::JoinObservation;
pub use lockdown::{LockdownRegistry, LockdownState};
pub use spam::SpamObservation;
pub use tracker::{AntiRaidTracker, CleanupStats};
pub use usernames::detect_suspicious_username;
