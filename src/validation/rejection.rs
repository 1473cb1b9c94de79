use serde::Serialize;
use std::fmt;

/// Category of a rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionKind {
    TooLong,
    CodeInjection,
    MarkupInjection,
    SuspiciousLink,
    Scam,
    InvalidMath,
    InvalidUrl,
    ForbiddenScheme,
    ForbiddenDomain,
    DangerousExtension,
    InvalidFilename,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::TooLong => "too_long",
            RejectionKind::CodeInjection => "code_injection",
            RejectionKind::MarkupInjection => "markup_injection",
            RejectionKind::SuspiciousLink => "suspicious_link",
            RejectionKind::Scam => "scam",
            RejectionKind::InvalidMath => "invalid_math",
            RejectionKind::InvalidUrl => "invalid_url",
            RejectionKind::ForbiddenScheme => "forbidden_scheme",
            RejectionKind::ForbiddenDomain => "forbidden_domain",
            RejectionKind::DangerousExtension => "dangerous_extension",
            RejectionKind::InvalidFilename => "invalid_filename",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A policy denial with the reason shown to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{reason}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub reason: String,
}

impl Rejection {
    pub fn new(kind: RejectionKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    pub fn too_long(max_length: usize) -> Self {
        Self::new(
            RejectionKind::TooLong,
            format!("Input too long (max: {max_length} characters)"),
        )
    }

    pub fn code_injection() -> Self {
        Self::new(RejectionKind::CodeInjection, "Code or script detected in input")
    }

    pub fn markup_injection() -> Self {
        Self::new(
            RejectionKind::MarkupInjection,
            "HTML/JavaScript content is not allowed",
        )
    }

    pub fn suspicious_link() -> Self {
        Self::new(RejectionKind::SuspiciousLink, "Suspicious or disallowed link")
    }

    pub fn scam() -> Self {
        Self::new(RejectionKind::Scam, "Suspicious content (potential scam)")
    }
}
