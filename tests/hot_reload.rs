//! Configuration reload keeps recorded history and swaps the rules.

use std::io::Write;

use guild_sentinel::config::{load_config, ConfigError};
use guild_sentinel::{GuildId, SentinelConfig};

mod common;

const TIGHTER: &str = r#"
[rate_limit.global]
max_attempts = 2
window_ms = 10000

[anti_raid]
join_threshold = 3

[gate]
privileged_actions = ["setwelcome", "sentinel-admin", "purge"]
"#;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_reload_applies_new_rules_to_existing_history() {
    let h = common::harness(SentinelConfig::default());
    let user = 5;

    // Two commands under the default 5/10s global rule.
    assert!(h.sentinel.check_security(&common::command(user, "ping", 1)).allowed);
    assert!(h.sentinel.check_security(&common::command(user, "ping", 1)).allowed);

    let file = write_config(TIGHTER);
    h.sentinel.reload(load_config(file.path()).unwrap());

    // The two recorded attempts already fill the tighter window.
    let verdict = h.sentinel.check_security(&common::command(user, "ping", 1));
    assert!(!verdict.allowed);
    assert!(verdict.user_message.contains("too many commands"));

    // New privileged action takes effect immediately.
    let verdict = h.sentinel.check_security(&common::command(6, "purge", 1));
    assert!(!verdict.allowed);

    // Join threshold dropped to three.
    for u in 0..2 {
        h.sentinel.screen_join(&common::join(9, u));
    }
    assert!(!h.sentinel.anti_raid().is_locked(GuildId(9)));
    h.sentinel.screen_join(&common::join(9, 2));
    assert!(h.sentinel.anti_raid().is_locked(GuildId(9)));
}

#[test]
fn test_reload_keeps_lockdowns_and_incidents() {
    let h = common::harness(SentinelConfig::default());
    h.sentinel.anti_raid().enable_lockdown(GuildId(1));
    h.sentinel
        .audit()
        .log_injection_attempt(guild_sentinel::UserId(3), "u", "eval(1)", "calc");

    h.sentinel.reload(SentinelConfig::default());

    assert!(h.sentinel.anti_raid().is_locked(GuildId(1)));
    assert_eq!(
        h.sentinel
            .audit()
            .user_stats(guild_sentinel::UserId(3))
            .unwrap()
            .criticals,
        1
    );
}

#[test]
fn test_invalid_config_is_refused() {
    let file = write_config(
        r#"
[incidents]
flag_threshold = 5
ban_threshold = 2
"#,
    );
    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => assert!(!errors.is_empty()),
        other => panic!("expected validation failure, got {other:?}"),
    }

    let file = write_config("[rate_limit\n");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
}
