//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sentinel_verdicts_total` (counter): gate verdicts by outcome, reason
//! - `sentinel_check_duration_seconds` (histogram): gate evaluation latency
//! - `sentinel_raids_detected_total` (counter)
//! - `sentinel_spam_detected_total` (counter)
//! - `sentinel_lockdowns_active` (gauge): guilds currently locked
//! - `sentinel_incidents_tracked` (gauge): users with an incident record
//! - `sentinel_audit_failures_total` (counter): failed sink writes by sink
//! - `sentinel_housekeeping_removed_total` (counter): entries reclaimed by sweep
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exporter is opt-in via configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_verdict(outcome: &'static str, reason: &'static str) {
    counter!("sentinel_verdicts_total", "outcome" => outcome, "reason" => reason).increment(1);
}

pub fn record_check_duration(start: Instant) {
    histogram!("sentinel_check_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_raid_detected() {
    counter!("sentinel_raids_detected_total").increment(1);
}

pub fn record_spam_detected() {
    counter!("sentinel_spam_detected_total").increment(1);
}

pub fn record_lockdowns_active(count: usize) {
    gauge!("sentinel_lockdowns_active").set(count as f64);
}

pub fn record_incidents_tracked(count: usize) {
    gauge!("sentinel_incidents_tracked").set(count as f64);
}

pub fn record_audit_failure(sink: &'static str) {
    counter!("sentinel_audit_failures_total", "sink" => sink).increment(1);
}

pub fn record_housekeeping(kind: &'static str, removed: usize) {
    counter!("sentinel_housekeeping_removed_total", "kind" => kind).increment(removed as u64);
}
