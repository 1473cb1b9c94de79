//! Shared fixtures for integration tests.

use std::sync::Arc;

use guild_sentinel::audit::{AuditSink, MemorySink, SecurityLog};
use guild_sentinel::screen::{IncomingJoin, IncomingMessage};
use guild_sentinel::{Action, Clock, GuildId, MockClock, Sentinel, SentinelConfig, UserId};

/// A sentinel driven by a mock clock, recording audit output in memory.
pub struct Harness {
    pub sentinel: Arc<Sentinel>,
    pub memory: Arc<MemorySink>,
    pub clock: MockClock,
}

#[allow(dead_code)]
pub fn harness(config: SentinelConfig) -> Harness {
    harness_with_sinks(config, Vec::new())
}

/// Like [`harness`], with `extra` sinks installed before the memory sink.
#[allow(dead_code)]
pub fn harness_with_sinks(config: SentinelConfig, extra: Vec<Arc<dyn AuditSink>>) -> Harness {
    let clock = MockClock::default();
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let memory = Arc::new(MemorySink::new());

    let mut audit = SecurityLog::new(config.incidents.clone(), Arc::clone(&shared));
    for sink in extra {
        audit = audit.with_sink(sink);
    }
    let audit = audit.with_sink(memory.clone());

    Harness {
        sentinel: Arc::new(Sentinel::with_audit(&config, shared, audit)),
        memory,
        clock,
    }
}

#[allow(dead_code)]
pub fn command(user: u64, name: &str, guild: u64) -> Action {
    Action::new(UserId(user), name)
        .named(format!("user{user}"))
        .in_guild(GuildId(guild))
}

#[allow(dead_code)]
pub fn join(guild: u64, user: u64) -> IncomingJoin {
    IncomingJoin {
        guild_id: GuildId(guild),
        guild_name: Some(format!("guild{guild}")),
        user_id: UserId(user),
        username: format!("member{user}"),
        account_age_secs: Some(365 * 86_400),
    }
}

#[allow(dead_code)]
pub fn message(user: u64, guild: u64, content: &str) -> IncomingMessage {
    IncomingMessage {
        author_id: UserId(user),
        author_name: format!("user{user}"),
        author_is_bot: false,
        guild_id: Some(GuildId(guild)),
        content: content.to_string(),
    }
}
