//! Per-user incident counts.

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::audit::record::Severity;
use crate::clock::Clock;
use crate::config::IncidentConfig;
use crate::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentRecord {
    pub warnings: u32,
    pub criticals: u32,
    pub last_incident_at: Instant,
}

impl IncidentRecord {
    pub fn total(&self) -> u32 {
        self.warnings + self.criticals
    }
}

/// Where a user stands against the alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Standing {
    Clear,
    Flagged,
    BanRecommended,
}

pub struct IncidentLedger {
    records: DashMap<UserId, IncidentRecord>,
    config: ArcSwap<IncidentConfig>,
    clock: Arc<dyn Clock>,
}

impl IncidentLedger {
    pub fn new(config: IncidentConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            config: ArcSwap::from_pointee(config),
            clock,
        }
    }

    /// Count an incident against `user`. Info records are ignored.
    ///
    /// Returns the updated record when the incident was counted.
    pub fn record(&self, user: UserId, level: Severity) -> Option<IncidentRecord> {
        if !level.is_incident() {
            return None;
        }
        let now = self.clock.now();
        let updated = {
            let mut entry = self.records.entry(user).or_insert(IncidentRecord {
                warnings: 0,
                criticals: 0,
                last_incident_at: now,
            });
            match level {
                Severity::Warning => entry.warnings += 1,
                Severity::Critical => entry.criticals += 1,
                Severity::Info => {}
            }
            entry.last_incident_at = now;
            *entry
        };
        self.evict_over_capacity(user);
        Some(updated)
    }

    /// Drop the stalest records until the ledger fits its bound again.
    /// `keep` is never evicted.
    fn evict_over_capacity(&self, keep: UserId) {
        let max = self.config.load().max_tracked_users;
        while self.records.len() > max {
            let stalest = self
                .records
                .iter()
                .filter(|r| *r.key() != keep)
                .min_by_key(|r| r.value().last_incident_at)
                .map(|r| *r.key());
            match stalest {
                Some(user) => {
                    self.records.remove(&user);
                    tracing::debug!(user = %user, "Evicted stalest incident record");
                }
                None => break,
            }
        }
    }

    pub fn get(&self, user: UserId) -> Option<IncidentRecord> {
        self.records.get(&user).map(|r| *r)
    }

    pub fn standing(&self, record: &IncidentRecord) -> Standing {
        let config = self.config.load();
        let total = record.total();
        if total >= config.ban_threshold {
            Standing::BanRecommended
        } else if total >= config.flag_threshold {
            Standing::Flagged
        } else {
            Standing::Clear
        }
    }

    pub fn reset(&self, user: UserId) -> bool {
        self.records.remove(&user).is_some()
    }

    /// Remove records whose last incident is older than the retention period.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let retention = self.config.load().retention();
        let before = self.records.len();
        self.records
            .retain(|_, r| now.saturating_duration_since(r.last_incident_at) <= retention);
        before.saturating_sub(self.records.len())
    }

    pub fn snapshot(&self) -> Vec<(UserId, IncidentRecord)> {
        let mut all: Vec<_> = self.records.iter().map(|r| (*r.key(), *r.value())).collect();
        all.sort_by_key(|(user, _)| *user);
        all
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> Arc<IncidentConfig> {
        self.config.load_full()
    }

    pub fn apply_config(&self, config: IncidentConfig) {
        self.config.store(Arc::new(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use std::time::Duration;

    fn ledger(config: IncidentConfig) -> (IncidentLedger, MockClock) {
        let clock = MockClock::default();
        (IncidentLedger::new(config, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_counts_by_severity() {
        let (ledger, _clock) = ledger(IncidentConfig::default());
        let user = UserId(1);

        assert!(ledger.record(user, Severity::Info).is_none());
        assert!(ledger.is_empty());

        ledger.record(user, Severity::Warning);
        let record = ledger.record(user, Severity::Critical).unwrap();
        assert_eq!((record.warnings, record.criticals), (1, 1));
        assert_eq!(ledger.standing(&record), Standing::Clear);
    }

    #[test]
    fn test_thresholds() {
        let (ledger, _clock) = ledger(IncidentConfig::default());
        let user = UserId(2);
        let mut last = None;
        for _ in 0..3 {
            last = ledger.record(user, Severity::Warning);
        }
        assert_eq!(ledger.standing(&last.unwrap()), Standing::Flagged);
        for _ in 0..2 {
            last = ledger.record(user, Severity::Critical);
        }
        assert_eq!(ledger.standing(&last.unwrap()), Standing::BanRecommended);
    }

    #[test]
    fn test_retention_cleanup() {
        let (ledger, clock) = ledger(IncidentConfig::default());
        ledger.record(UserId(1), Severity::Warning);
        clock.advance(Duration::from_secs(29 * 86_400));
        ledger.record(UserId(2), Severity::Warning);
        clock.advance(Duration::from_secs(2 * 86_400));

        assert_eq!(ledger.cleanup(), 1);
        assert!(ledger.get(UserId(1)).is_none());
        assert!(ledger.get(UserId(2)).is_some());
    }

    #[test]
    fn test_bounded_by_evicting_stalest() {
        let (ledger, clock) = ledger(IncidentConfig {
            max_tracked_users: 2,
            ..IncidentConfig::default()
        });
        for id in 1..=3 {
            ledger.record(UserId(id), Severity::Warning);
            clock.advance_ms(10);
        }
        assert_eq!(ledger.len(), 2);
        assert!(ledger.get(UserId(1)).is_none());
        assert!(ledger.get(UserId(3)).is_some());
    }

    #[test]
    fn test_reset() {
        let (ledger, _clock) = ledger(IncidentConfig::default());
        ledger.record(UserId(9), Severity::Critical);
        assert!(ledger.reset(UserId(9)));
        assert!(!ledger.reset(UserId(9)));
        assert!(ledger.get(UserId(9)).is_none());
    }
}
