//! Repeated-message detection.
//!
//! Only exact repeats count; a burst of different messages is left to the
//! rate limiter.

use ahash::RandomState;
use std::time::{Duration, Instant};

use crate::ids::{GuildId, UserId};
use crate::window::SlidingWindowCounter;

/// Result of recording a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpamObservation {
    pub spam: bool,
    /// Live messages from the same user in the same guild with identical content.
    pub identical: usize,
}

/// Per-(user, guild) window of content hashes.
#[derive(Debug, Default)]
pub struct SpamDetector {
    messages: SlidingWindowCounter<(UserId, GuildId), u64>,
    hasher: RandomState,
}

impl SpamDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(
        &self,
        user: UserId,
        guild: GuildId,
        content: &str,
        now: Instant,
        window: Duration,
        threshold: usize,
    ) -> SpamObservation {
        let hash = self.hasher.hash_one(content);
        let identical = self.messages.record_with((user, guild), hash, now, window, |list| {
            list.iter().filter(|e| e.payload == hash).count()
        });
        SpamObservation {
            spam: identical >= threshold,
            identical,
        }
    }

    pub fn prune(&self, now: Instant, max_age: Duration) -> usize {
        self.messages.prune(now, max_age)
    }

    pub fn tracked_users(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(5_000);

    #[test]
    fn test_identical_messages_trigger() {
        let detector = SpamDetector::new();
        let t0 = Instant::now();
        let (user, guild) = (UserId(1), GuildId(1));

        for i in 0..4u64 {
            let obs = detector.observe(user, guild, "buy now", t0 + Duration::from_millis(i * 10), WINDOW, 5);
            assert!(!obs.spam);
        }
        let obs = detector.observe(user, guild, "buy now", t0 + Duration::from_millis(50), WINDOW, 5);
        assert!(obs.spam);
        assert_eq!(obs.identical, 5);
    }

    #[test]
    fn test_distinct_and_interleaved_messages() {
        let detector = SpamDetector::new();
        let t0 = Instant::now();
        let (user, guild) = (UserId(1), GuildId(1));

        for i in 0..5u64 {
            let obs = detector.observe(user, guild, &format!("message {i}"), t0, WINDOW, 5);
            assert!(!obs.spam);
        }

        // Repeats interleaved with other content still count.
        let mut last = SpamObservation { spam: false, identical: 0 };
        for i in 0..5 {
            last = detector.observe(user, guild, "same", t0, WINDOW, 5);
            detector.observe(user, guild, &format!("noise {i}"), t0, WINDOW, 5);
        }
        assert!(last.spam);

        // Same content in another guild is a separate window.
        assert_eq!(detector.observe(user, GuildId(2), "same", t0, WINDOW, 5).identical, 1);
    }

    #[test]
    fn test_repeats_age_out() {
        let detector = SpamDetector::new();
        let t0 = Instant::now();
        let (user, guild) = (UserId(1), GuildId(1));

        for _ in 0..4 {
            detector.observe(user, guild, "hi", t0, WINDOW, 5);
        }
        let obs = detector.observe(user, guild, "hi", t0 + WINDOW, WINDOW, 5);
        assert!(!obs.spam);
        assert_eq!(obs.identical, 1);
    }
}
