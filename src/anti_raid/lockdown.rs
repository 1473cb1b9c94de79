//! Guild lockdown state machine.
//!
//! # States
//! - Unlocked: normal operation
//! - Locked: every gated command in the guild is denied
//!
//! # State Transitions
//! ```text
//! Unlocked → Locked: raid detected or explicit enable (expires_at = now + duration)
//! Locked → Locked: re-armed, expires_at replaced (last write wins, never stacks)
//! Locked → Unlocked: timer expiry or explicit disable
//! ```
//!
//! # Design Decisions
//! - Expiry is checked against the clock on every read, so the state is
//!   correct even when no timer runs (no runtime, or a late timer)
//! - The timer only reclaims the entry; a generation number keeps a stale
//!   timer from unlocking a re-armed lockdown

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::ids::GuildId;
use crate::observability::metrics;

/// Longest lockdown a single enable can arm.
pub const MAX_LOCKDOWN: Duration = Duration::from_secs(365 * 86_400);

/// Observable lockdown state of a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockdownState {
    Unlocked,
    Locked { expires_at: Instant },
}

impl LockdownState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockdownState::Locked { .. })
    }
}

#[derive(Debug)]
struct Lock {
    expires_at: Instant,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Lock {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn count_active(locks: &DashMap<GuildId, Lock>, now: Instant) -> usize {
    locks.iter().filter(|l| l.expires_at > now).count()
}

/// Lockdown registry with cancellable expiry timers keyed by guild.
#[derive(Debug)]
pub struct LockdownRegistry {
    locks: Arc<DashMap<GuildId, Lock>>,
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl LockdownRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            generation: AtomicU64::new(0),
            clock,
        }
    }

    /// Spawn the expiry timer if a Tokio runtime is available.
    fn schedule(&self, guild: GuildId, generation: u64, after: Duration) -> Option<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let locks = Arc::clone(&self.locks);
        let clock = Arc::clone(&self.clock);
        // Deadline fixed now, not at the task's first poll.
        let deadline = tokio::time::Instant::now() + after;
        Some(handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if locks
                .remove_if(&guild, |_, lock| lock.generation == generation)
                .is_some()
            {
                tracing::info!(guild = %guild, "Lockdown lifted");
                metrics::record_lockdowns_active(count_active(&locks, clock.now()));
            }
        }))
    }

    /// Lock `guild` for `duration`, replacing any pending lockdown.
    pub fn enable(&self, guild: GuildId, duration: Duration) -> LockdownState {
        let duration = duration.min(MAX_LOCKDOWN);
        let expires_at = self.clock.now() + duration;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let timer = self.schedule(guild, generation, duration);

        let previous = self.locks.insert(
            guild,
            Lock {
                expires_at,
                generation,
                timer,
            },
        );
        let rearmed = match previous {
            Some(mut lock) => {
                lock.cancel_timer();
                true
            }
            None => false,
        };

        tracing::error!(
            guild = %guild,
            duration_ms = duration.as_millis() as u64,
            rearmed,
            "Lockdown enabled"
        );
        metrics::record_lockdowns_active(self.active());
        LockdownState::Locked { expires_at }
    }

    /// Lift the lockdown on `guild`. Returns whether it was locked.
    pub fn disable(&self, guild: GuildId) -> bool {
        let now = self.clock.now();
        match self.locks.remove(&guild) {
            Some((_, mut lock)) => {
                lock.cancel_timer();
                let was_locked = lock.expires_at > now;
                tracing::info!(guild = %guild, was_locked, "Lockdown disabled");
                metrics::record_lockdowns_active(self.active());
                was_locked
            }
            None => false,
        }
    }

    pub fn state(&self, guild: GuildId) -> LockdownState {
        let now = self.clock.now();
        match self.locks.get(&guild) {
            Some(lock) if lock.expires_at > now => LockdownState::Locked {
                expires_at: lock.expires_at,
            },
            _ => LockdownState::Unlocked,
        }
    }

    pub fn is_locked(&self, guild: GuildId) -> bool {
        self.state(guild).is_locked()
    }

    /// Time left before `guild` unlocks.
    pub fn remaining(&self, guild: GuildId) -> Option<Duration> {
        match self.state(guild) {
            LockdownState::Locked { expires_at } => {
                Some(expires_at.saturating_duration_since(self.clock.now()))
            }
            LockdownState::Unlocked => None,
        }
    }

    /// Number of guilds currently locked.
    pub fn active(&self) -> usize {
        count_active(&self.locks, self.clock.now())
    }

    /// Drop entries whose lifetime has ended. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.locks.len();
        self.locks.retain(|_, lock| {
            if lock.expires_at > now {
                true
            } else {
                lock.cancel_timer();
                false
            }
        });
        let removed = before.saturating_sub(self.locks.len());
        if removed > 0 {
            metrics::record_lockdowns_active(self.active());
        }
        removed
    }

    /// Entries held, including expired ones not yet reclaimed.
    pub fn entries(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for LockdownRegistry {
    fn drop(&mut self) {
        for mut lock in self.locks.iter_mut() {
            lock.cancel_timer();
        }
    }
}
