//! Sliding-window timestamp counter.
//!
//! # Responsibilities
//! - Keep an ordered list of timestamps (and optional payloads) per key
//! - Filter out expired entries on every read
//! - Reclaim idle keys on an explicit sweep
//!
//! # Design Decisions
//! - The boundary moves with `now`; nothing resets on fixed intervals
//! - An entry is live while `now - occurred_at < window`
//! - Per-key operations run under the DashMap shard lock, so a check and its
//!   record are one step and same-key callers are serialised

use dashmap::DashMap;
use std::collections::VecDeque;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A single recorded occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampEntry<T> {
    pub occurred_at: Instant,
    pub payload: T,
}

/// Per-key sliding window of timestamps.
#[derive(Debug)]
pub struct SlidingWindowCounter<K, T = ()>
where
    K: Eq + Hash,
{
    entries: DashMap<K, VecDeque<TimestampEntry<T>>>,
}

fn is_live(occurred_at: Instant, now: Instant, window: Duration) -> bool {
    now.saturating_duration_since(occurred_at) < window
}

fn expire<T>(list: &mut VecDeque<TimestampEntry<T>>, now: Instant, window: Duration) {
    list.retain(|e| is_live(e.occurred_at, now, window));
}

fn oldest<T>(list: &VecDeque<TimestampEntry<T>>) -> Option<Instant> {
    list.iter().map(|e| e.occurred_at).min()
}

impl<K, T> SlidingWindowCounter<K, T>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Append an entry with a payload and let `f` inspect the surviving
    /// entries (including the new one) while the key is still locked.
    pub fn record_with<R>(
        &self,
        key: K,
        payload: T,
        now: Instant,
        window: Duration,
        f: impl FnOnce(&VecDeque<TimestampEntry<T>>) -> R,
    ) -> R {
        let mut list = self.entries.entry(key).or_default();
        expire(&mut list, now, window);
        list.push_back(TimestampEntry {
            occurred_at: now,
            payload,
        });
        f(&list)
    }

    /// Prune, then record only if fewer than `max` entries survive.
    ///
    /// Returns the post-record count, or the oldest surviving timestamp when
    /// the window is full.
    pub fn try_record_with(
        &self,
        key: K,
        payload: T,
        now: Instant,
        window: Duration,
        max: usize,
    ) -> Result<usize, Instant> {
        let mut list = self.entries.entry(key).or_default();
        expire(&mut list, now, window);
        if list.len() >= max {
            return Err(oldest(&list).unwrap_or(now));
        }
        list.push_back(TimestampEntry {
            occurred_at: now,
            payload,
        });
        Ok(list.len())
    }

    /// Count live entries for `key`, pruning expired ones on the way.
    pub fn count_in_window(&self, key: &K, now: Instant, window: Duration) -> usize {
        match self.entries.get_mut(key) {
            Some(mut list) => {
                expire(&mut list, now, window);
                list.len()
            }
            None => 0,
        }
    }

    /// Oldest live timestamp for `key`.
    pub fn oldest_in_window(&self, key: &K, now: Instant, window: Duration) -> Option<Instant> {
        self.entries
            .get(key)
            .and_then(|list| {
                list.iter()
                    .map(|e| e.occurred_at)
                    .filter(|t| is_live(*t, now, window))
                    .min()
            })
    }

    /// Full sweep: drop entries older than `max_age` and keys left empty.
    /// Returns the number of keys removed.
    pub fn prune(&self, now: Instant, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, list| {
            expire(list, now, max_age);
            !list.is_empty()
        });
        before.saturating_sub(self.entries.len())
    }

    pub fn remove(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Keep only the keys for which `keep` returns true.
    pub fn retain_keys(&self, mut keep: impl FnMut(&K) -> bool) {
        self.entries.retain(|k, _| keep(k));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<K> SlidingWindowCounter<K, ()>
where
    K: Eq + Hash,
{
    /// Append a timestamp and return the live count including it.
    pub fn record(&self, key: K, now: Instant, window: Duration) -> usize {
        self.record_with(key, (), now, window, |list| list.len())
    }

    pub fn try_record(
        &self,
        key: K,
        now: Instant,
        window: Duration,
        max: usize,
    ) -> Result<usize, Instant> {
        self.try_record_with(key, (), now, window, max)
    }
}

impl<K, T> Default for SlidingWindowCounter<K, T>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1000);

    #[test]
    fn test_record_counts_live_entries() {
        let counter: SlidingWindowCounter<&str> = SlidingWindowCounter::new();
        let t0 = Instant::now();

        assert_eq!(counter.record("a", t0, WINDOW), 1);
        assert_eq!(counter.record("a", t0 + Duration::from_millis(500), WINDOW), 2);
        // First entry is exactly one window old and no longer live.
        assert_eq!(counter.record("a", t0 + WINDOW, WINDOW), 2);
        assert_eq!(counter.record("b", t0, WINDOW), 1);
    }

    #[test]
    fn test_try_record_reports_oldest_when_full() {
        let counter: SlidingWindowCounter<u8> = SlidingWindowCounter::new();
        let t0 = Instant::now();

        assert_eq!(counter.try_record(1, t0, WINDOW, 2), Ok(1));
        assert_eq!(counter.try_record(1, t0 + Duration::from_millis(10), WINDOW, 2), Ok(2));
        assert_eq!(counter.try_record(1, t0 + Duration::from_millis(20), WINDOW, 2), Err(t0));
        // Denied attempts are not recorded.
        assert_eq!(counter.count_in_window(&1, t0 + Duration::from_millis(20), WINDOW), 2);
        assert_eq!(counter.try_record(1, t0 + WINDOW, WINDOW, 2), Ok(2));
    }

    #[test]
    fn test_record_with_payload_inspection() {
        let counter: SlidingWindowCounter<u8, u64> = SlidingWindowCounter::new();
        let t0 = Instant::now();

        counter.record_with(1, 7, t0, WINDOW, |_| ());
        counter.record_with(1, 8, t0, WINDOW, |_| ());
        let sevens = counter.record_with(1, 7, t0, WINDOW, |list| {
            list.iter().filter(|e| e.payload == 7).count()
        });
        assert_eq!(sevens, 2);
    }

    #[test]
    fn test_prune_removes_idle_keys_only() {
        let counter: SlidingWindowCounter<u8> = SlidingWindowCounter::new();
        let t0 = Instant::now();

        counter.record(1, t0, WINDOW);
        counter.record(2, t0 + Duration::from_secs(50), WINDOW);

        let removed = counter.prune(t0 + Duration::from_secs(60), Duration::from_secs(30));
        assert_eq!(removed, 1);
        assert_eq!(counter.len(), 1);
        assert_eq!(counter.count_in_window(&2, t0 + Duration::from_secs(50), WINDOW), 1);
    }

    #[test]
    fn test_retain_keys_and_remove() {
        let counter: SlidingWindowCounter<(u8, u8)> = SlidingWindowCounter::new();
        let t0 = Instant::now();
        counter.record((1, 1), t0, WINDOW);
        counter.record((1, 2), t0, WINDOW);
        counter.record((2, 1), t0, WINDOW);

        counter.retain_keys(|(user, _)| *user != 1);
        assert_eq!(counter.len(), 1);
        assert!(counter.remove(&(2, 1)));
        assert!(counter.is_empty());
    }
}
