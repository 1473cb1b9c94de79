//! Join-burst detection.

use std::time::{Duration, Instant};

use crate::ids::{GuildId, UserId};
use crate::window::SlidingWindowCounter;

/// Result of recording a member join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinObservation {
    pub raid_suspected: bool,
    pub joins_in_window: usize,
}

/// Per-guild window of `(user, joined_at)`.
#[derive(Debug, Default)]
pub struct JoinTracker {
    joins: SlidingWindowCounter<GuildId, UserId>,
}

impl JoinTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join; a raid is suspected once the live count reaches `threshold`.
    pub fn track(
        &self,
        guild: GuildId,
        user: UserId,
        now: Instant,
        window: Duration,
        threshold: usize,
    ) -> JoinObservation {
        let joins_in_window = self.joins.record_with(guild, user, now, window, |list| list.len());
        JoinObservation {
            raid_suspected: joins_in_window >= threshold,
            joins_in_window,
        }
    }

    pub fn joins_in_window(&self, guild: GuildId, now: Instant, window: Duration) -> usize {
        self.joins.count_in_window(&guild, now, window)
    }

    pub fn prune(&self, now: Instant, max_age: Duration) -> usize {
        self.joins.prune(now, max_age)
    }

    pub fn tracked_guilds(&self) -> usize {
        self.joins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_reached_exactly() {
        let tracker = JoinTracker::new();
        let t0 = Instant::now();
        let window = Duration::from_millis(10_000);
        let guild = GuildId(1);

        for i in 0..4u64 {
            let obs = tracker.track(guild, UserId(i), t0 + Duration::from_millis(i * 100), window, 5);
            assert!(!obs.raid_suspected);
        }
        let fifth = tracker.track(guild, UserId(5), t0 + Duration::from_millis(500), window, 5);
        assert!(fifth.raid_suspected);
        assert_eq!(fifth.joins_in_window, 5);

        // Other guilds are independent.
        assert!(!tracker.track(GuildId(2), UserId(1), t0, window, 5).raid_suspected);
    }
}
