//! Per-user command throttling.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::{RateLimitConfig, RateLimitRule};
use crate::ids::UserId;
use crate::window::SlidingWindowCounter;

/// Which window an attempt is counted against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// All actions of a user.
    Global,
    /// A single named action of a user.
    Action(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("GLOBAL"),
            Scope::Action(name) => f.write_str(name),
        }
    }
}

/// Outcome of a per-action check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Seconds until the oldest attempt leaves the window; 0 when allowed.
    pub retry_after_secs: u64,
}

impl RateDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }
}

/// `ceil((oldest + window - now) / 1s)`, never below one second while the
/// window is still occupied.
pub fn retry_after_secs(oldest: Instant, window: Duration, now: Instant) -> u64 {
    let remaining = (oldest + window).saturating_duration_since(now);
    let secs = remaining.as_nanos().div_ceil(1_000_000_000) as u64;
    secs.max(1)
}

/// Sliding-window rate limiter keyed by user and scope.
///
/// A check is also the record: an allowed attempt consumes a slot, a denied
/// one does not.
pub struct RateLimiter {
    rules: ArcSwap<RateLimitConfig>,
    attempts: SlidingWindowCounter<(UserId, Scope)>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules: ArcSwap::from_pointee(config),
            attempts: SlidingWindowCounter::new(),
            clock,
        }
    }

    /// Override for `action`, or the global rule.
    pub fn rule_for(&self, action: &str) -> RateLimitRule {
        let rules = self.rules.load();
        rules.actions.get(action).copied().unwrap_or(rules.global)
    }

    fn attempt(&self, user: UserId, scope: Scope, rule: RateLimitRule) -> RateDecision {
        let now = self.clock.now();
        match self.attempts.try_record(
            (user, scope),
            now,
            rule.window(),
            rule.max_attempts as usize,
        ) {
            Ok(_) => RateDecision::allow(),
            Err(oldest) => RateDecision {
                allowed: false,
                retry_after_secs: retry_after_secs(oldest, rule.window(), now),
            },
        }
    }

    /// Apply the global rule across all actions of `user`.
    pub fn check_global(&self, user: UserId) -> bool {
        let rule = self.rules.load().global;
        let decision = self.attempt(user, Scope::Global, rule);
        if !decision.allowed {
            tracing::warn!(user = %user, "Global rate limit reached");
        }
        decision.allowed
    }

    /// Apply the rule for `action` (falling back to the global rule).
    pub fn check_action(&self, user: UserId, action: &str) -> RateDecision {
        let rule = self.rule_for(action);
        let decision = self.attempt(user, Scope::Action(action.to_string()), rule);
        if !decision.allowed {
            tracing::warn!(
                user = %user,
                action,
                retry_after_secs = decision.retry_after_secs,
                "Action rate limit reached"
            );
        }
        decision
    }

    /// Drop every window belonging to `user`.
    pub fn reset(&self, user: UserId) {
        self.attempts.retain_keys(|(owner, _)| *owner != user);
        tracing::info!(user = %user, "Rate limits reset");
    }

    /// Housekeeping sweep. Returns the number of idle keys reclaimed.
    ///
    /// Attempts still inside their rule window are never discarded, whatever
    /// `max_age_secs` says.
    pub fn prune(&self) -> usize {
        let max_age = self.rules.load().sweep_age();
        let removed = self.attempts.prune(self.clock.now(), max_age);
        tracing::debug!(
            removed,
            remaining = self.attempts.len(),
            "Rate limiter cleanup"
        );
        removed
    }

    /// Swap the rule table. Recorded attempts are kept.
    pub fn apply_config(&self, config: RateLimitConfig) {
        self.rules.store(Arc::new(config));
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.rules.load().cleanup_interval_secs)
    }

    /// Number of (user, scope) windows currently held.
    pub fn tracked_keys(&self) -> usize {
        self.attempts.len()
    }
}
