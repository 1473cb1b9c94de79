//! Event screens for chat messages and member joins.
//!
//! Commands go through the [`SecurityGate`](crate::gate::SecurityGate);
//! everything else a guild emits passes through one of these.

pub mod join;
pub mod message;

pub use join::{IncomingJoin, JoinScreen, JoinVerdict};
pub use message::{IncomingMessage, MessageScreen, MessageVerdict};
