//! Anti-raid facade: joins, spam, lockdowns and usernames behind one handle.

use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;

use crate::anti_raid::joins::{JoinObservation, JoinTracker};
use crate::anti_raid::lockdown::{LockdownRegistry, LockdownState};
use crate::anti_raid::spam::{SpamDetector, SpamObservation};
use crate::anti_raid::usernames;
use crate::clock::Clock;
use crate::config::AntiRaidConfig;
use crate::ids::{GuildId, UserId};
use crate::observability::metrics;

/// What a cleanup sweep reclaimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub guilds: usize,
    pub users: usize,
    pub lockdowns: usize,
}

impl CleanupStats {
    pub fn total(&self) -> usize {
        self.guilds + self.users + self.lockdowns
    }
}

pub struct AntiRaidTracker {
    config: ArcSwap<AntiRaidConfig>,
    joins: JoinTracker,
    spam: SpamDetector,
    lockdowns: LockdownRegistry,
    clock: Arc<dyn Clock>,
}

impl AntiRaidTracker {
    pub fn new(config: AntiRaidConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            joins: JoinTracker::new(),
            spam: SpamDetector::new(),
            lockdowns: LockdownRegistry::new(Arc::clone(&clock)),
            clock,
        }
    }

    pub fn config(&self) -> Arc<AntiRaidConfig> {
        self.config.load_full()
    }

    /// Record a member join and report whether the guild looks raided.
    pub fn track_join(&self, guild: GuildId, user: UserId) -> JoinObservation {
        let config = self.config.load();
        let observation = self.joins.track(
            guild,
            user,
            self.clock.now(),
            config.join_window(),
            config.join_threshold as usize,
        );
        if observation.raid_suspected {
            tracing::error!(
                guild = %guild,
                joins = observation.joins_in_window,
                window_ms = config.join_window_ms,
                "Raid suspected"
            );
            metrics::record_raid_detected();
        }
        observation
    }

    /// Lock `guild` for the configured duration.
    pub fn enable_lockdown(&self, guild: GuildId) -> LockdownState {
        let duration = self.config.load().lockdown_duration();
        self.lockdowns.enable(guild, duration)
    }

    pub fn enable_lockdown_for(&self, guild: GuildId, duration: Duration) -> LockdownState {
        self.lockdowns.enable(guild, duration)
    }

    pub fn disable_lockdown(&self, guild: GuildId) -> bool {
        self.lockdowns.disable(guild)
    }

    pub fn is_locked(&self, guild: GuildId) -> bool {
        self.lockdowns.is_locked(guild)
    }

    pub fn lockdown_state(&self, guild: GuildId) -> LockdownState {
        self.lockdowns.state(guild)
    }

    pub fn lockdown_expires_in(&self, guild: GuildId) -> Option<Duration> {
        self.lockdowns.remaining(guild)
    }

    pub fn locked_guilds(&self) -> usize {
        self.lockdowns.active()
    }

    /// Record a message and report whether it repeats often enough to be spam.
    pub fn detect_spam(&self, user: UserId, guild: GuildId, content: &str) -> SpamObservation {
        let config = self.config.load();
        let observation = self.spam.observe(
            user,
            guild,
            content,
            self.clock.now(),
            config.spam_window(),
            config.spam_threshold as usize,
        );
        if observation.spam {
            tracing::warn!(
                user = %user,
                guild = %guild,
                identical = observation.identical,
                "Spam detected"
            );
            metrics::record_spam_detected();
        }
        observation
    }

    pub fn detect_suspicious_username(&self, name: &str) -> bool {
        usernames::detect_suspicious_username(name)
    }

    /// Reclaim history older than `max_age_secs` (or the join/spam window,
    /// when longer) and ended lockdowns.
    pub fn cleanup(&self) -> CleanupStats {
        let now = self.clock.now();
        let max_age = self.config.load().sweep_age();
        let stats = CleanupStats {
            guilds: self.joins.prune(now, max_age),
            users: self.spam.prune(now, max_age),
            lockdowns: self.lockdowns.sweep(),
        };
        tracing::debug!(
            guilds = self.joins.tracked_guilds(),
            users = self.spam.tracked_users(),
            "Anti-raid cleanup"
        );
        stats
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.config.load().cleanup_interval_secs)
    }

    pub fn apply_config(&self, config: AntiRaidConfig) {
        self.config.store(Arc::new(config));
    }
}
