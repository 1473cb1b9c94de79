//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, thresholds > 0)
//! - Check threshold ordering and rule consistency
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SentinelConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{FieldKind, RateLimitRule, SentinelConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{path}: must be greater than zero")]
    Zero { path: String },

    #[error("incidents.ban_threshold ({ban}) must not be lower than incidents.flag_threshold ({flag})")]
    ThresholdOrder { flag: u32, ban: u32 },

    #[error("gate.field_rules.{action}: field {field:?} is declared more than once")]
    DuplicateField { action: String, field: String },

    #[error("gate.field_rules.{action}.{field}: allowed_domains only applies to url fields")]
    DomainsOnNonUrl { action: String, field: String },

    #[error("{path}: {max_age_secs}s is shorter than the {window_ms}ms window it sweeps")]
    SweepShorterThanWindow {
        path: String,
        max_age_secs: u64,
        window_ms: u64,
    },

    #[error("observability.metrics_address: {0:?} is not a socket address")]
    MetricsAddress(String),
}

fn check_rule(path: &str, rule: &RateLimitRule, errors: &mut Vec<ValidationError>) {
    if rule.max_attempts == 0 {
        errors.push(ValidationError::Zero {
            path: format!("{path}.max_attempts"),
        });
    }
    if rule.window_ms == 0 {
        errors.push(ValidationError::Zero {
            path: format!("{path}.window_ms"),
        });
    }
}

fn check_sweep_age(path: &str, max_age_secs: u64, window_ms: u64, errors: &mut Vec<ValidationError>) {
    if max_age_secs != 0 && max_age_secs.saturating_mul(1_000) < window_ms {
        errors.push(ValidationError::SweepShorterThanWindow {
            path: path.to_string(),
            max_age_secs,
            window_ms,
        });
    }
}

fn check_positive(path: &str, value: u64, errors: &mut Vec<ValidationError>) {
    if value == 0 {
        errors.push(ValidationError::Zero {
            path: path.to_string(),
        });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SentinelConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_rule("rate_limit.global", &config.rate_limit.global, &mut errors);
    let mut actions: Vec<_> = config.rate_limit.actions.iter().collect();
    actions.sort_by(|a, b| a.0.cmp(b.0));
    for (name, rule) in actions {
        check_rule(&format!("rate_limit.actions.{name}"), rule, &mut errors);
    }
    check_positive(
        "rate_limit.cleanup_interval_secs",
        config.rate_limit.cleanup_interval_secs,
        &mut errors,
    );
    check_positive("rate_limit.max_age_secs", config.rate_limit.max_age_secs, &mut errors);
    check_sweep_age(
        "rate_limit.max_age_secs",
        config.rate_limit.max_age_secs,
        config.rate_limit.longest_window().as_millis() as u64,
        &mut errors,
    );

    let raid = &config.anti_raid;
    check_positive("anti_raid.join_threshold", raid.join_threshold as u64, &mut errors);
    check_positive("anti_raid.join_window_ms", raid.join_window_ms, &mut errors);
    check_positive("anti_raid.spam_threshold", raid.spam_threshold as u64, &mut errors);
    check_positive("anti_raid.spam_window_ms", raid.spam_window_ms, &mut errors);
    check_positive("anti_raid.lockdown_duration_ms", raid.lockdown_duration_ms, &mut errors);
    check_positive("anti_raid.cleanup_interval_secs", raid.cleanup_interval_secs, &mut errors);
    check_positive("anti_raid.max_age_secs", raid.max_age_secs, &mut errors);
    check_sweep_age(
        "anti_raid.max_age_secs",
        raid.max_age_secs,
        raid.join_window_ms.max(raid.spam_window_ms),
        &mut errors,
    );

    check_positive(
        "validation.default_max_length",
        config.validation.default_max_length as u64,
        &mut errors,
    );

    let incidents = &config.incidents;
    check_positive("incidents.flag_threshold", incidents.flag_threshold as u64, &mut errors);
    check_positive("incidents.ban_threshold", incidents.ban_threshold as u64, &mut errors);
    check_positive(
        "incidents.max_tracked_users",
        incidents.max_tracked_users as u64,
        &mut errors,
    );
    check_positive(
        "incidents.cleanup_interval_secs",
        incidents.cleanup_interval_secs,
        &mut errors,
    );
    if incidents.ban_threshold < incidents.flag_threshold {
        errors.push(ValidationError::ThresholdOrder {
            flag: incidents.flag_threshold,
            ban: incidents.ban_threshold,
        });
    }

    let mut rules: Vec<_> = config.gate.field_rules.iter().collect();
    rules.sort_by(|a, b| a.0.cmp(b.0));
    for (action, fields) in rules {
        let mut seen = std::collections::HashSet::new();
        for rule in fields {
            if !seen.insert(rule.field.as_str()) {
                errors.push(ValidationError::DuplicateField {
                    action: action.clone(),
                    field: rule.field.clone(),
                });
            }
            if rule.kind != FieldKind::Url && !rule.allowed_domains.is_empty() {
                errors.push(ValidationError::DomainsOnNonUrl {
                    action: action.clone(),
                    field: rule.field.clone(),
                });
            }
            if rule.max_length == Some(0) {
                errors.push(ValidationError::Zero {
                    path: format!("gate.field_rules.{action}.{}.max_length", rule.field),
                });
            }
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
