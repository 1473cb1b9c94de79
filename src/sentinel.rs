//! Composition root wiring every component from one configuration.

use std::sync::Arc;

use crate::anti_raid::AntiRaidTracker;
use crate::audit::{AuditError, SecurityLog};
use crate::clock::Clock;
use crate::config::SentinelConfig;
use crate::gate::{Action, AdminCommand, AdminOutcome, SecurityGate, Verdict};
use crate::rate_limit::RateLimiter;
use crate::screen::{
    IncomingJoin, IncomingMessage, JoinScreen, JoinVerdict, MessageScreen, MessageVerdict,
};
use crate::validation::InputValidator;

/// Owns the components and hands out shared handles to them.
///
/// Each map lives in exactly one component; the gate and the screens only
/// hold `Arc` handles to those owners.
pub struct Sentinel {
    clock: Arc<dyn Clock>,
    limiter: Arc<RateLimiter>,
    anti_raid: Arc<AntiRaidTracker>,
    validator: Arc<InputValidator>,
    audit: Arc<SecurityLog>,
    gate: SecurityGate,
    messages: MessageScreen,
    joins: JoinScreen,
}

impl Sentinel {
    /// Build with the audit sinks named in `config.audit`.
    pub fn new(config: &SentinelConfig, clock: Arc<dyn Clock>) -> Result<Self, AuditError> {
        let audit = SecurityLog::from_config(
            &config.audit,
            config.incidents.clone(),
            Arc::clone(&clock),
        )?;
        Ok(Self::with_audit(config, clock, audit))
    }

    /// Build around an already assembled [`SecurityLog`].
    pub fn with_audit(config: &SentinelConfig, clock: Arc<dyn Clock>, audit: SecurityLog) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.clone(),
            Arc::clone(&clock),
        ));
        let anti_raid = Arc::new(AntiRaidTracker::new(
            config.anti_raid.clone(),
            Arc::clone(&clock),
        ));
        let validator = Arc::new(InputValidator::new(config.validation.clone()));
        let audit = Arc::new(audit);

        let gate = SecurityGate::new(
            config.gate.clone(),
            Arc::clone(&limiter),
            Arc::clone(&anti_raid),
            Arc::clone(&validator),
            Arc::clone(&audit),
        );
        let messages = MessageScreen::new(
            Arc::clone(&anti_raid),
            Arc::clone(&validator),
            Arc::clone(&audit),
        );
        let joins = JoinScreen::new(Arc::clone(&anti_raid), Arc::clone(&audit));

        tracing::info!(
            global_max = config.rate_limit.global.max_attempts,
            global_window_ms = config.rate_limit.global.window_ms,
            join_threshold = config.anti_raid.join_threshold,
            spam_threshold = config.anti_raid.spam_threshold,
            "Sentinel initialized"
        );

        Self {
            clock,
            limiter,
            anti_raid,
            validator,
            audit,
            gate,
            messages,
            joins,
        }
    }

    pub fn check_security(&self, action: &Action) -> Verdict {
        self.gate.check_security(action)
    }

    pub fn execute_admin(&self, action: &Action, command: AdminCommand) -> AdminOutcome {
        self.gate.execute_admin(action, command)
    }

    pub fn screen_message(&self, message: &IncomingMessage) -> MessageVerdict {
        self.messages.screen(message)
    }

    pub fn screen_join(&self, join: &IncomingJoin) -> JoinVerdict {
        self.joins.screen(join)
    }

    /// Swap every rule table. Recorded history, lockdowns and incident
    /// counts are kept; audit sinks are not reopened.
    pub fn reload(&self, config: SentinelConfig) {
        self.limiter.apply_config(config.rate_limit);
        self.anti_raid.apply_config(config.anti_raid);
        self.validator.apply_config(config.validation);
        self.gate.apply_config(config.gate);
        self.audit.apply_config(config.incidents);
        tracing::info!("Configuration reloaded");
    }

    pub fn gate(&self) -> &SecurityGate {
        &self.gate
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn anti_raid(&self) -> &Arc<AntiRaidTracker> {
        &self.anti_raid
    }

    pub fn validator(&self) -> &Arc<InputValidator> {
        &self.validator
    }

    pub fn audit(&self) -> &Arc<SecurityLog> {
        &self.audit
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
