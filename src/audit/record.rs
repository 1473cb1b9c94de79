//! Structured security records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Warning and critical records count as incidents.
    pub fn is_incident(&self) -> bool {
        matches!(self, Severity::Warning | Severity::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    CommandBlockedLockdown,
    RateLimitExceeded,
    UnauthorizedAccess,
    InjectionAttempt,
    SpamDetected,
    RaidDetected,
    SuspiciousContent,
    SuspiciousUsername,
    SuspiciousNewMember,
    NewAccountJoined,
    SecurityError,
    UserFlagged,
    BanRecommended,
    UserIncidentsReset,
    RateLimitsReset,
    LockdownActivated,
    LockdownLifted,
    CleanupCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::CommandBlockedLockdown => "COMMAND_BLOCKED_LOCKDOWN",
            EventKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            EventKind::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            EventKind::InjectionAttempt => "INJECTION_ATTEMPT",
            EventKind::SpamDetected => "SPAM_DETECTED",
            EventKind::RaidDetected => "RAID_DETECTED",
            EventKind::SuspiciousContent => "SUSPICIOUS_CONTENT",
            EventKind::SuspiciousUsername => "SUSPICIOUS_USERNAME",
            EventKind::SuspiciousNewMember => "SUSPICIOUS_NEW_MEMBER",
            EventKind::NewAccountJoined => "NEW_ACCOUNT_JOINED",
            EventKind::SecurityError => "SECURITY_ERROR",
            EventKind::UserFlagged => "USER_FLAGGED",
            EventKind::BanRecommended => "BAN_RECOMMENDED",
            EventKind::UserIncidentsReset => "USER_INCIDENTS_RESET",
            EventKind::RateLimitsReset => "RATE_LIMITS_RESET",
            EventKind::LockdownActivated => "LOCKDOWN_ACTIVATED",
            EventKind::LockdownLifted => "LOCKDOWN_LIFTED",
            EventKind::CleanupCompleted => "CLEANUP_COMPLETED",
        }
    }

    /// Records emitted by the ledger itself; they never feed back into it.
    pub fn is_threshold(&self) -> bool {
        matches!(self, EventKind::UserFlagged | EventKind::BanRecommended)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SecurityRecord {
    pub fn new(level: Severity, kind: EventKind, user_id: Option<UserId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            kind,
            user_id,
            fields: Map::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}
