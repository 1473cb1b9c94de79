use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::audit::incidents::{IncidentLedger, IncidentRecord, Standing};
use crate::audit::record::{EventKind, SecurityRecord, Severity};
use crate::audit::sink::{AuditError, AuditSink, JsonLinesSink, TracingSink};
use crate::clock::Clock;
use crate::config::{AuditConfig, IncidentConfig};
use crate::ids::{GuildId, UserId};
use crate::observability::metrics;
use crate::validation::truncate;

const DEFAULT_PAYLOAD_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub warnings: u32,
    pub criticals: u32,
    pub total_incidents: u32,
}

impl UserSummary {
    fn new(user_id: UserId, record: &IncidentRecord) -> Self {
        Self {
            user_id,
            warnings: record.warnings,
            criticals: record.criticals,
            total_incidents: record.total(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    pub generated_at: DateTime<Utc>,
    pub total_users: usize,
    pub flagged_users: Vec<UserSummary>,
    pub ban_recommended: Vec<UserSummary>,
}

/// Fans security records out to the sinks and keeps the incident ledger.
///
/// Writing never fails from the caller's point of view: a sink error is
/// logged and counted, and the remaining sinks still receive the record.
pub struct SecurityLog {
    sinks: Vec<Arc<dyn AuditSink>>,
    ledger: IncidentLedger,
    payload_limit: AtomicUsize,
}

impl SecurityLog {
    pub fn new(config: IncidentConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sinks: Vec::new(),
            ledger: IncidentLedger::new(config, clock),
            payload_limit: AtomicUsize::new(DEFAULT_PAYLOAD_LIMIT),
        }
    }

    /// Build the sinks named by `audit`.
    pub fn from_config(
        audit: &AuditConfig,
        incidents: IncidentConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuditError> {
        let mut log = Self::new(incidents, clock);
        if audit.tracing {
            log = log.with_sink(Arc::new(TracingSink));
        }
        if let Some(path) = &audit.security_log_path {
            let incidents_path = audit.incidents_log_path.as_deref().map(Path::new);
            log = log.with_sink(Arc::new(JsonLinesSink::open(
                Path::new(path),
                incidents_path,
            )?));
        }
        Ok(log)
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn set_payload_limit(&self, limit: usize) {
        self.payload_limit.store(limit, Ordering::Relaxed);
    }

    pub fn ledger(&self) -> &IncidentLedger {
        &self.ledger
    }

    fn emit(&self, record: &SecurityRecord) {
        for sink in &self.sinks {
            if let Err(e) = sink.write(record) {
                tracing::error!(
                    sink = sink.name(),
                    kind = %record.kind,
                    error = %e,
                    "Audit sink write failed"
                );
                metrics::record_audit_failure(sink.name());
            }
        }
    }

    /// Emit `record`, count it against its user, and raise a threshold
    /// record when the user's standing crosses a threshold.
    pub fn log(&self, record: SecurityRecord) {
        self.emit(&record);

        if record.kind.is_threshold() {
            return;
        }
        let (Some(user), true) = (record.user_id, record.level.is_incident()) else {
            return;
        };
        let Some(updated) = self.ledger.record(user, record.level) else {
            return;
        };
        metrics::record_incidents_tracked(self.ledger.len());

        let threshold = match self.ledger.standing(&updated) {
            Standing::BanRecommended => {
                SecurityRecord::new(Severity::Critical, EventKind::BanRecommended, Some(user))
            }
            Standing::Flagged => {
                SecurityRecord::new(Severity::Warning, EventKind::UserFlagged, Some(user))
            }
            Standing::Clear => return,
        };
        self.emit(
            &threshold
                .field("warnings", updated.warnings)
                .field("criticals", updated.criticals)
                .field("total_incidents", updated.total()),
        );
    }

    pub fn log_rate_limit_exceeded(&self, user: UserId, username: &str, scope: &str) {
        self.log(
            SecurityRecord::new(Severity::Warning, EventKind::RateLimitExceeded, Some(user))
                .field("username", username)
                .field("command", scope),
        );
    }

    pub fn log_injection_attempt(&self, user: UserId, username: &str, input: &str, command: &str) {
        let limit = self.payload_limit.load(Ordering::Relaxed);
        self.log(
            SecurityRecord::new(Severity::Critical, EventKind::InjectionAttempt, Some(user))
                .field("username", username)
                .field("input", truncate(input, limit))
                .field("command", command)
                .field("action", "BLOCKED"),
        );
    }

    pub fn log_unauthorized_access(
        &self,
        user: UserId,
        username: &str,
        command: &str,
        required: &str,
    ) {
        self.log(
            SecurityRecord::new(Severity::Warning, EventKind::UnauthorizedAccess, Some(user))
                .field("username", username)
                .field("command", command)
                .field("required_permission", required)
                .field("action", "DENIED"),
        );
    }

    pub fn log_spam_detected(
        &self,
        user: UserId,
        username: &str,
        guild: GuildId,
        message_count: usize,
    ) {
        self.log(
            SecurityRecord::new(Severity::Warning, EventKind::SpamDetected, Some(user))
                .field("username", username)
                .field("guild_id", guild.get())
                .field("message_count", message_count),
        );
    }

    /// Raids are not attributed to any single user.
    pub fn log_raid_detected(&self, guild: GuildId, guild_name: Option<&str>, joins: usize) {
        let mut record = SecurityRecord::new(Severity::Critical, EventKind::RaidDetected, None)
            .field("guild_id", guild.get())
            .field("join_count", joins)
            .field("action", "LOCKDOWN_ACTIVATED");
        if let Some(name) = guild_name {
            record = record.field("guild_name", name);
        }
        self.log(record);
    }

    pub fn log_suspicious_content(
        &self,
        user: UserId,
        username: &str,
        content_type: &str,
        reason: &str,
    ) {
        self.log(
            SecurityRecord::new(Severity::Warning, EventKind::SuspiciousContent, Some(user))
                .field("username", username)
                .field("content_type", content_type)
                .field("reason", reason)
                .field("action", "BLOCKED"),
        );
    }

    pub fn log_security_error(&self, error: &dyn std::error::Error, context: &str) {
        self.log(
            SecurityRecord::new(Severity::Critical, EventKind::SecurityError, None)
                .field("error", error.to_string())
                .field("context", context),
        );
    }

    pub fn reset_user_incidents(&self, user: UserId) -> bool {
        let removed = self.ledger.reset(user);
        self.log(SecurityRecord::new(
            Severity::Info,
            EventKind::UserIncidentsReset,
            Some(user),
        ));
        metrics::record_incidents_tracked(self.ledger.len());
        removed
    }

    pub fn user_stats(&self, user: UserId) -> Option<IncidentRecord> {
        self.ledger.get(user)
    }

    pub fn generate_report(&self) -> SecurityReport {
        let mut report = SecurityReport {
            generated_at: Utc::now(),
            total_users: 0,
            flagged_users: Vec::new(),
            ban_recommended: Vec::new(),
        };
        for (user, record) in self.ledger.snapshot() {
            report.total_users += 1;
            match self.ledger.standing(&record) {
                Standing::BanRecommended => {
                    report.ban_recommended.push(UserSummary::new(user, &record))
                }
                Standing::Flagged => report.flagged_users.push(UserSummary::new(user, &record)),
                Standing::Clear => {}
            }
        }
        report
    }

    /// Purge records past retention; returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let removed = self.ledger.cleanup();
        self.log(
            SecurityRecord::new(Severity::Info, EventKind::CleanupCompleted, None)
                .field("removed_users", removed)
                .field("remaining_users", self.ledger.len()),
        );
        metrics::record_incidents_tracked(self.ledger.len());
        removed
    }

    pub fn apply_config(&self, config: IncidentConfig) {
        self.ledger.apply_config(config);
    }
}
