//! Security audit subsystem.
//!
//! # Data Flow
//! ```text
//! Denial / detection:
//!     → log.rs (SecurityLog builds a SecurityRecord)
//!     → sink.rs (tracing, JSON lines, memory)
//!     → incidents.rs (warning/critical with a user → ledger)
//!     → threshold crossed → UserFlagged / BanRecommended record
//! ```
//!
//! # Design Decisions
//! - Sink failures are logged and counted but never reach the caller
//! - Threshold records go to the sinks only; they are not counted again

pub mod incidents;
pub mod log;
pub mod record;
pub mod sink;

pub use incidents::{IncidentLedger, IncidentRecord, Standing};
pub use log::{SecurityLog, SecurityReport, UserSummary};
pub use record::{EventKind, SecurityRecord, Severity};
pub use sink::{AuditError, AuditSink, JsonLinesSink, MemorySink, TracingSink};
