use serde::Serialize;

use crate::validation::{Rejection, RejectionKind};

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Denial {
    /// The guild is in lockdown. No retry hint is given.
    Locked,
    RateLimited {
        /// `GLOBAL` or the action name.
        scope: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        retry_after_secs: Option<u64>,
    },
    Unauthorized {
        required: String,
    },
    ValidationRejected {
        field: String,
        kind: RejectionKind,
        reason: String,
    },
}

impl Denial {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Denial::Locked => "locked",
            Denial::RateLimited { .. } => "rate_limited",
            Denial::Unauthorized { .. } => "unauthorized",
            Denial::ValidationRejected { .. } => "validation_rejected",
        }
    }
}

/// Caller-facing outcome of a security check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub allowed: bool,
    pub user_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<Denial>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            user_message: String::new(),
            retry_after_secs: None,
            denial: None,
        }
    }

    pub fn locked() -> Self {
        Self::deny(
            Denial::Locked,
            "🔒 The server is currently in protection mode. Please try again in a few minutes.",
        )
    }

    pub fn global_rate_limited() -> Self {
        Self::deny(
            Denial::RateLimited {
                scope: "GLOBAL".to_string(),
                retry_after_secs: None,
            },
            "⏱️ You are sending too many commands. Please wait a few seconds.",
        )
    }

    pub fn action_rate_limited(action: &str, retry_after_secs: u64) -> Self {
        let mut verdict = Self::deny(
            Denial::RateLimited {
                scope: action.to_string(),
                retry_after_secs: Some(retry_after_secs),
            },
            format!(
                "⏱️ You are using this command too quickly. Try again in {retry_after_secs} second(s)."
            ),
        );
        verdict.retry_after_secs = Some(retry_after_secs);
        verdict
    }

    pub fn unauthorized(required: &str) -> Self {
        Self::deny(
            Denial::Unauthorized {
                required: required.to_string(),
            },
            "❌ This command is reserved for administrators.",
        )
    }

    pub fn rejected(field: &str, rejection: Rejection) -> Self {
        let message = format!("❌ {}", rejection.reason);
        Self::deny(
            Denial::ValidationRejected {
                field: field.to_string(),
                kind: rejection.kind,
                reason: rejection.reason,
            },
            message,
        )
    }

    fn deny(denial: Denial, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            user_message: message.into(),
            retry_after_secs: None,
            denial: Some(denial),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.denial, Some(Denial::Locked))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message_carries_hint() {
        let verdict = Verdict::action_rate_limited("calc", 4);
        assert!(!verdict.allowed);
        assert_eq!(verdict.retry_after_secs, Some(4));
        assert!(verdict.user_message.contains("4 second(s)"));
    }

    #[test]
    fn test_serialised_denial() {
        let json = serde_json::to_value(Verdict::locked()).unwrap();
        assert_eq!(json["allowed"], false);
        assert_eq!(json["denial"]["type"], "locked");
        assert!(json.get("retry_after_secs").is_none());

        let json = serde_json::to_value(Verdict::rejected(
            "expression",
            Rejection::code_injection(),
        ))
        .unwrap();
        assert_eq!(json["denial"]["kind"], "CODE_INJECTION");
        assert_eq!(json["denial"]["field"], "expression");
    }
}
