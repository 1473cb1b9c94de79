use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::anti_raid::{AntiRaidTracker, LockdownState};
use crate::audit::{EventKind, SecurityLog, SecurityRecord, Severity};
use crate::config::SECS_PER_DAY;
use crate::ids::{GuildId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingJoin {
    pub guild_id: GuildId,
    #[serde(default)]
    pub guild_name: Option<String>,
    pub user_id: UserId,
    #[serde(default)]
    pub username: String,
    /// Seconds since the account was created, when known.
    #[serde(default)]
    pub account_age_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum JoinVerdict {
    /// Raid threshold reached; the guild is now locked and no welcome is sent.
    RaidLockdown { joins_in_window: usize },
    Welcome { suspicious: bool, new_account: bool },
}

/// Screens member joins for raids and suspicious newcomers.
pub struct JoinScreen {
    anti_raid: Arc<AntiRaidTracker>,
    audit: Arc<SecurityLog>,
}

impl JoinScreen {
    pub fn new(anti_raid: Arc<AntiRaidTracker>, audit: Arc<SecurityLog>) -> Self {
        Self { anti_raid, audit }
    }

    pub fn screen(&self, join: &IncomingJoin) -> JoinVerdict {
        let guild = join.guild_id;
        let observation = self.anti_raid.track_join(guild, join.user_id);

        if observation.raid_suspected {
            let state = self.anti_raid.enable_lockdown(guild);
            self.audit.log_raid_detected(
                guild,
                join.guild_name.as_deref(),
                observation.joins_in_window,
            );
            if let LockdownState::Locked { .. } = state {
                let expires_in_ms = self
                    .anti_raid
                    .lockdown_expires_in(guild)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default();
                self.audit.log(
                    SecurityRecord::new(Severity::Info, EventKind::LockdownActivated, None)
                        .field("guild_id", guild.get())
                        .field("expires_in_ms", expires_in_ms),
                );
            }
            return JoinVerdict::RaidLockdown {
                joins_in_window: observation.joins_in_window,
            };
        }

        let suspicious = self.anti_raid.detect_suspicious_username(&join.username);
        if suspicious {
            let mut record =
                SecurityRecord::new(Severity::Warning, EventKind::SuspiciousNewMember, Some(join.user_id))
                    .field("username", join.username.as_str())
                    .field("guild_id", guild.get());
            if let Some(age) = join.account_age_secs {
                record = record.field("account_age_secs", age);
            }
            self.audit.log(record);
        }

        let threshold = self.anti_raid.config().new_account_age();
        let new_account = join
            .account_age_secs
            .is_some_and(|age| Duration::from_secs(age) < threshold);
        if new_account {
            self.audit.log(
                SecurityRecord::new(Severity::Info, EventKind::NewAccountJoined, Some(join.user_id))
                    .field("username", join.username.as_str())
                    .field("guild_id", guild.get())
                    .field(
                        "account_age_days",
                        join.account_age_secs.unwrap_or_default() / SECS_PER_DAY,
                    ),
            );
        }

        JoinVerdict::Welcome {
            suspicious,
            new_account,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::clock::{Clock, MockClock};
    use crate::config::{AntiRaidConfig, IncidentConfig};

    fn screen() -> (JoinScreen, Arc<AntiRaidTracker>, Arc<MemorySink>, MockClock) {
        let mock = MockClock::default();
        let clock: Arc<dyn Clock> = Arc::new(mock.clone());
        let memory = Arc::new(MemorySink::new());
        let audit = Arc::new(
            SecurityLog::new(IncidentConfig::default(), Arc::clone(&clock)).with_sink(memory.clone()),
        );
        let tracker = Arc::new(AntiRaidTracker::new(AntiRaidConfig::default(), clock));
        (JoinScreen::new(Arc::clone(&tracker), audit), tracker, memory, mock)
    }

    fn join(user: u64, name: &str, age_days: u64) -> IncomingJoin {
        IncomingJoin {
            guild_id: GuildId(100),
            guild_name: Some("test guild".into()),
            user_id: UserId(user),
            username: name.into(),
            account_age_secs: Some(age_days * SECS_PER_DAY),
        }
    }

    #[test]
    fn test_burst_locks_guild() {
        let (screen, tracker, memory, clock) = screen();
        for i in 0..4 {
            assert!(matches!(
                screen.screen(&join(i, "member", 365)),
                JoinVerdict::Welcome { .. }
            ));
            clock.advance_ms(1_500);
        }
        assert_eq!(
            screen.screen(&join(4, "member", 365)),
            JoinVerdict::RaidLockdown { joins_in_window: 5 }
        );
        assert!(tracker.is_locked(GuildId(100)));

        let raid = &memory.of_kind(EventKind::RaidDetected)[0];
        assert_eq!(raid.level, Severity::Critical);
        assert!(raid.user_id.is_none());
        assert_eq!(memory.count(EventKind::LockdownActivated), 1);
    }

    #[test]
    fn test_newcomer_flags() {
        let (screen, _tracker, memory, _clock) = screen();
        assert_eq!(
            screen.screen(&join(1, "discord.gg/raid", 1)),
            JoinVerdict::Welcome {
                suspicious: true,
                new_account: true
            }
        );
        assert_eq!(memory.count(EventKind::SuspiciousNewMember), 1);
        assert_eq!(memory.count(EventKind::NewAccountJoined), 1);

        assert_eq!(
            screen.screen(&join(2, "bob", 30)),
            JoinVerdict::Welcome {
                suspicious: false,
                new_account: false
            }
        );
    }

    #[test]
    fn test_huge_account_age_threshold_does_not_overflow() {
        let mock = MockClock::default();
        let clock: Arc<dyn Clock> = Arc::new(mock.clone());
        let audit = Arc::new(SecurityLog::new(IncidentConfig::default(), Arc::clone(&clock)));
        let tracker = Arc::new(AntiRaidTracker::new(
            AntiRaidConfig {
                new_account_age_days: u64::MAX / 2,
                ..AntiRaidConfig::default()
            },
            clock,
        ));
        let screen = JoinScreen::new(tracker, audit);

        assert_eq!(
            screen.screen(&join(1, "bob", 10_000)),
            JoinVerdict::Welcome {
                suspicious: false,
                new_account: true
            }
        );
    }
}
