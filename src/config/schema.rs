//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sentinel.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const SECS_PER_DAY: u64 = 86_400;

/// Root configuration for the sentinel.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SentinelConfig {
    /// Command throttling rules.
    pub rate_limit: RateLimitConfig,

    /// Join-burst, spam and lockdown settings.
    pub anti_raid: AntiRaidConfig,

    /// Content validation settings.
    pub validation: ValidationConfig,

    /// Command gate settings (privileges, per-action payload rules).
    pub gate: GateConfig,

    /// Per-user incident tracking.
    pub incidents: IncidentConfig,

    /// Audit sinks.
    pub audit: AuditConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// A throttling rule: at most `max_attempts` within a sliding `window_ms`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_attempts: u32,
    pub window_ms: u64,
}

impl RateLimitRule {
    pub const fn new(max_attempts: u32, window_ms: u64) -> Self {
        Self {
            max_attempts,
            window_ms,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Rule applied across all actions, and to actions without an override.
    pub global: RateLimitRule,

    /// Per-action overrides keyed by action name.
    pub actions: HashMap<String, RateLimitRule>,

    /// Housekeeping sweep interval in seconds.
    pub cleanup_interval_secs: u64,

    /// Attempts older than this are discarded by the sweep.
    pub max_age_secs: u64,
}

impl RateLimitConfig {
    /// Longest window among the global rule and every override.
    pub fn longest_window(&self) -> Duration {
        self.actions
            .values()
            .map(RateLimitRule::window)
            .fold(self.global.window(), Duration::max)
    }

    /// Age past which the sweep may discard an attempt. Never shorter than
    /// a rule window.
    pub fn sweep_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs).max(self.longest_window())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut actions = HashMap::new();
        actions.insert("calc".to_string(), RateLimitRule::new(3, 5_000));
        actions.insert("info".to_string(), RateLimitRule::new(2, 10_000));
        actions.insert("setwelcome".to_string(), RateLimitRule::new(1, 30_000));
        Self {
            global: RateLimitRule::new(5, 10_000),
            actions,
            cleanup_interval_secs: 300,
            max_age_secs: 3_600,
        }
    }
}

/// Anti-raid configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AntiRaidConfig {
    /// Joins within `join_window_ms` that count as a raid.
    pub join_threshold: u32,
    pub join_window_ms: u64,

    /// Identical messages within `spam_window_ms` that count as spam.
    pub spam_threshold: u32,
    pub spam_window_ms: u64,

    /// Lifetime of an automatic lockdown.
    pub lockdown_duration_ms: u64,

    /// Housekeeping sweep interval in seconds.
    pub cleanup_interval_secs: u64,

    /// Join/message history older than this is discarded by the sweep.
    pub max_age_secs: u64,

    /// Accounts younger than this are reported when they join.
    pub new_account_age_days: u64,
}

impl AntiRaidConfig {
    pub fn join_window(&self) -> Duration {
        Duration::from_millis(self.join_window_ms)
    }

    pub fn spam_window(&self) -> Duration {
        Duration::from_millis(self.spam_window_ms)
    }

    pub fn lockdown_duration(&self) -> Duration {
        Duration::from_millis(self.lockdown_duration_ms)
    }

    /// Age past which join and message history may be discarded. Never
    /// shorter than the join or spam window.
    pub fn sweep_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
            .max(self.join_window())
            .max(self.spam_window())
    }

    pub fn new_account_age(&self) -> Duration {
        Duration::from_secs(self.new_account_age_days.saturating_mul(SECS_PER_DAY))
    }
}

impl Default for AntiRaidConfig {
    fn default() -> Self {
        Self {
            join_threshold: 5,
            join_window_ms: 10_000,
            spam_threshold: 5,
            spam_window_ms: 5_000,
            lockdown_duration_ms: 300_000,
            cleanup_interval_secs: 60,
            max_age_secs: 3_600,
            new_account_age_days: 7,
        }
    }
}

/// Content validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum length of free text when no field rule says otherwise.
    pub default_max_length: usize,

    /// Invite codes that are never treated as suspicious links.
    pub invite_whitelist: Vec<String>,

    /// Number of characters of a rejected input quoted in log lines.
    pub log_excerpt_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            default_max_length: 2_000,
            invite_whitelist: vec!["official".to_string()],
            log_excerpt_chars: 50,
        }
    }
}

/// How a payload field is validated.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free text, full content validation.
    Text,
    /// Arithmetic expression: tokenizer check, then content validation.
    Math,
    /// An http(s) URL, optionally restricted to `allowed_domains`.
    Url,
}

/// Validation rule for one payload field of an action.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FieldRule {
    pub field: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub allow_links: bool,
    #[serde(default)]
    pub allow_code: bool,
    #[serde(default)]
    pub allowed_domains: Vec<String>,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, kind: FieldKind, max_length: usize) -> Self {
        Self {
            field: field.into(),
            kind,
            max_length: Some(max_length),
            allow_links: false,
            allow_code: false,
            allowed_domains: Vec::new(),
        }
    }
}

/// Command gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GateConfig {
    /// Actions that require administrator rights.
    pub privileged_actions: Vec<String>,

    /// Payload validation rules keyed by action name.
    pub field_rules: HashMap<String, Vec<FieldRule>>,

    /// Rejected payloads are truncated to this many characters in the audit log.
    pub audit_payload_limit: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        let mut field_rules = HashMap::new();
        field_rules.insert(
            "calc".to_string(),
            vec![FieldRule::new("expression", FieldKind::Math, 500)],
        );
        field_rules.insert(
            "info".to_string(),
            vec![FieldRule::new("sujet", FieldKind::Text, 2_000)],
        );
        Self {
            privileged_actions: vec!["setwelcome".to_string(), "sentinel-admin".to_string()],
            field_rules,
            audit_payload_limit: 200,
        }
    }
}

/// Per-user incident tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct IncidentConfig {
    /// Total incidents at which a user is flagged.
    pub flag_threshold: u32,

    /// Total incidents at which a ban is recommended.
    pub ban_threshold: u32,

    /// Warnings at which a user is considered suspicious.
    pub suspicious_warning_threshold: u32,

    /// Records idle for longer than this are purged.
    pub retention_days: u64,

    /// Housekeeping sweep interval in seconds.
    pub cleanup_interval_secs: u64,

    /// Upper bound on tracked users; the stalest record is evicted beyond it.
    pub max_tracked_users: usize,
}

impl IncidentConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.saturating_mul(SECS_PER_DAY))
    }
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            flag_threshold: 3,
            ban_threshold: 5,
            suspicious_warning_threshold: 3,
            retention_days: 30,
            cleanup_interval_secs: 86_400,
            max_tracked_users: 10_000,
        }
    }
}

/// Audit sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AuditConfig {
    /// Mirror security records into the tracing pipeline.
    pub tracing: bool,

    /// Append every record as a JSON line to this file.
    pub security_log_path: Option<String>,

    /// Append Warning and Critical records to this file as well.
    pub incidents_log_path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            tracing: true,
            security_log_path: None,
            incidents_log_path: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
