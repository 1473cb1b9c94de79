use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;

use crate::anti_raid::AntiRaidTracker;
use crate::audit::{EventKind, SecurityLog, SecurityRecord, Severity};
use crate::config::{FieldKind, FieldRule, GateConfig};
use crate::gate::action::Action;
use crate::gate::verdict::Verdict;
use crate::ids::UserId;
use crate::observability::metrics;
use crate::rate_limit::RateLimiter;
use crate::validation::{InputValidator, Rejection, ValidateOptions};

pub(crate) const ADMIN_PERMISSION: &str = "Administrator";

/// Single entry point deciding whether a command may run.
pub struct SecurityGate {
    config: ArcSwap<GateConfig>,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) anti_raid: Arc<AntiRaidTracker>,
    validator: Arc<InputValidator>,
    pub(crate) audit: Arc<SecurityLog>,
}

impl SecurityGate {
    pub fn new(
        config: GateConfig,
        limiter: Arc<RateLimiter>,
        anti_raid: Arc<AntiRaidTracker>,
        validator: Arc<InputValidator>,
        audit: Arc<SecurityLog>,
    ) -> Self {
        audit.set_payload_limit(config.audit_payload_limit);
        Self {
            config: ArcSwap::from_pointee(config),
            limiter,
            anti_raid,
            validator,
            audit,
        }
    }

    /// Evaluate `action` and return the verdict.
    ///
    /// Checks run in a fixed order and stop at the first denial: lockdown,
    /// global rate limit, per-action rate limit, privilege, payload. Nothing
    /// after a denial is evaluated, so a denied action never consumes a rate
    /// slot it did not reach.
    pub fn check_security(&self, action: &Action) -> Verdict {
        let start = Instant::now();
        let verdict = self.evaluate(action);
        metrics::record_check_duration(start);

        match &verdict.denial {
            None => metrics::record_verdict("allowed", "none"),
            Some(denial) => {
                metrics::record_verdict("denied", denial.label());
                tracing::debug!(
                    user = %action.caller_id,
                    action = %action.action_name,
                    reason = denial.label(),
                    "Action denied"
                );
            }
        }
        verdict
    }

    fn evaluate(&self, action: &Action) -> Verdict {
        let user = action.caller_id;
        let name = action.caller_display_name.as_str();
        let command = action.action_name.as_str();

        if let Some(guild) = action.guild_id {
            if self.anti_raid.is_locked(guild) {
                self.audit.log(
                    SecurityRecord::new(
                        Severity::Warning,
                        EventKind::CommandBlockedLockdown,
                        Some(user),
                    )
                    .field("username", name)
                    .field("command", command)
                    .field("guild_id", guild.get()),
                );
                return Verdict::locked();
            }
        }

        if !self.limiter.check_global(user) {
            self.audit.log_rate_limit_exceeded(user, name, "GLOBAL");
            return Verdict::global_rate_limited();
        }

        let decision = self.limiter.check_action(user, command);
        if !decision.allowed {
            self.audit.log_rate_limit_exceeded(user, name, command);
            return Verdict::action_rate_limited(command, decision.retry_after_secs);
        }

        let config = self.config.load();
        if config.privileged_actions.iter().any(|p| p == command) && !action.caller_is_admin {
            self.audit
                .log_unauthorized_access(user, name, command, ADMIN_PERMISSION);
            return Verdict::unauthorized(ADMIN_PERMISSION);
        }

        for rule in config.field_rules.get(command).into_iter().flatten() {
            let Some(value) = action.payload.get(&rule.field) else {
                continue;
            };
            if let Err(rejection) = self.check_field(rule, value) {
                self.audit.log_injection_attempt(user, name, value, command);
                return Verdict::rejected(&rule.field, rejection);
            }
        }

        Verdict::allow()
    }

    fn check_field(&self, rule: &FieldRule, value: &str) -> Result<(), Rejection> {
        let opts = ValidateOptions {
            max_length: rule
                .max_length
                .unwrap_or_else(|| self.validator.default_options().max_length),
            allow_links: rule.allow_links,
            allow_code: rule.allow_code,
        };
        match rule.kind {
            FieldKind::Math => {
                self.validator.validate_math_expression(value)?;
                self.validator.validate(value, opts).map(|_| ())
            }
            FieldKind::Text => self.validator.validate(value, opts).map(|_| ()),
            FieldKind::Url => {
                if value.chars().count() > opts.max_length {
                    return Err(Rejection::too_long(opts.max_length));
                }
                self.validator.validate_url(value, &rule.allowed_domains)
            }
        }
    }

    /// A user is suspicious when their name matches a raid-bot heuristic or
    /// their incident record shows any critical or repeated warnings.
    pub fn is_user_suspicious(&self, user: UserId, username: &str) -> bool {
        if self.anti_raid.detect_suspicious_username(username) {
            self.audit.log(
                SecurityRecord::new(Severity::Warning, EventKind::SuspiciousUsername, Some(user))
                    .field("username", username),
            );
            return true;
        }
        let threshold = self.audit.ledger().config().suspicious_warning_threshold;
        self.audit
            .user_stats(user)
            .is_some_and(|r| r.criticals > 0 || r.warnings >= threshold)
    }

    pub fn apply_config(&self, config: GateConfig) {
        self.audit.set_payload_limit(config.audit_payload_limit);
        self.config.store(Arc::new(config));
    }
}
