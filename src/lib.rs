//! Anti-abuse pipeline for chat-guild bots.
//!
//! Every inbound command passes through the [`SecurityGate`], which combines
//! guild lockdown, sliding-window rate limits, privilege checks and payload
//! validation into one [`Verdict`]. Chat messages and member joins go through
//! the [`screen`] module. Every denial and detection is written to the
//! [`audit`] sinks and counted against the offending user.

// Primitives
pub mod clock;
pub mod ids;
pub mod window;

// Components
pub mod anti_raid;
pub mod audit;
pub mod gate;
pub mod rate_limit;
pub mod screen;
pub mod validation;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub mod sentinel;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::SentinelConfig;
pub use gate::{Action, AdminCommand, AdminOutcome, Denial, SecurityGate, Verdict};
pub use ids::{GuildId, UserId};
pub use lifecycle::{Housekeeper, Shutdown};
pub use sentinel::Sentinel;
