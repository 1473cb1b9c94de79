//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! Security records are produced separately by the `audit` subsystem and are
//! mirrored into tracing under the `guild_sentinel::audit` target.

pub mod logging;
pub mod metrics;
