//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Sentinel::new → Housekeeper::spawn
//!
//! Shutdown (shutdown.rs):
//!     End of input or Ctrl-C (signals.rs) → trigger → sweeps exit → join
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown signal out to every task
//! - Housekeeping loops are independent; a slow sweep never delays another

pub mod housekeeping;
pub mod shutdown;
pub mod signals;

pub use housekeeping::Housekeeper;
pub use shutdown::Shutdown;
pub use signals::shutdown_on_ctrl_c;
