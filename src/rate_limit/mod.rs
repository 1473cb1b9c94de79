//! Rate limiting subsystem.
//!
//! # Data Flow
//! ```text
//! Command invocation:
//!     → check_global (one window per user, all actions)
//!     → check_action (one window per user and action, rule override or global)
//!     → verdict consumed by the gate
//! ```
//!
//! # Design Decisions
//! - Sliding window, not token bucket: once `max_attempts` fall inside
//!   `window_ms`, everything is denied until the oldest attempt ages out
//! - Denied attempts are never recorded
//! - Rule table is swapped atomically on reload; history is kept

pub mod limiter;

pub use crate::config::RateLimitRule;
pub use limiter::{retry_after_secs, RateDecision, RateLimiter, Scope};
