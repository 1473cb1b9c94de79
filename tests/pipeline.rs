//! End-to-end behaviour of the gate, screens and audit trail.

use guild_sentinel::audit::EventKind;
use guild_sentinel::screen::{JoinVerdict, MessageVerdict};
use guild_sentinel::validation::{InputValidator, ValidateOptions};
use guild_sentinel::{AdminCommand, AdminOutcome, Denial, GuildId, SentinelConfig, UserId};

mod common;

#[test]
fn test_raid_locks_guild_for_every_caller() {
    let h = common::harness(SentinelConfig::default());
    let guild = 500;

    // Six joins spread over eight seconds; the fifth crosses 5/10s.
    let mut verdicts = Vec::new();
    for user in 0..6 {
        verdicts.push(h.sentinel.screen_join(&common::join(guild, user)));
        h.clock.advance_ms(1_600);
    }
    assert!(matches!(verdicts[4], JoinVerdict::RaidLockdown { joins_in_window: 5 }));
    assert!(matches!(verdicts[5], JoinVerdict::RaidLockdown { .. }));
    assert!(h.sentinel.anti_raid().is_locked(GuildId(guild)));

    // Admins and fresh users alike are turned away.
    for action in [
        common::command(1, "ping", guild),
        common::command(2, "setwelcome", guild).as_admin(),
        common::command(3, "calc", guild).with_arg("expression", "1+1"),
    ] {
        let verdict = h.sentinel.check_security(&action);
        assert!(!verdict.allowed);
        assert_eq!(verdict.denial, Some(Denial::Locked));
        assert!(verdict.user_message.contains("protection mode"));
        assert_eq!(verdict.retry_after_secs, None);
    }
    assert_eq!(h.memory.count(EventKind::CommandBlockedLockdown), 3);

    // Lockdown is bounded: five minutes later commands go through again.
    h.clock.advance_ms(300_000);
    assert!(h.sentinel.check_security(&common::command(1, "ping", guild)).allowed);
}

#[test]
fn test_raid_record_is_not_attributed() {
    let h = common::harness(SentinelConfig::default());
    for user in 0..5 {
        h.sentinel.screen_join(&common::join(7, user));
    }
    let raids = h.memory.of_kind(EventKind::RaidDetected);
    assert_eq!(raids.len(), 1);
    assert!(raids[0].user_id.is_none());
    assert!(h.sentinel.audit().ledger().is_empty());
}

#[test]
fn test_rate_limit_retry_hint_and_reset() {
    let h = common::harness(SentinelConfig::default());
    let user = 42;

    for _ in 0..3 {
        assert!(h.sentinel.check_security(&common::command(user, "calc", 1)).allowed);
        h.clock.advance_ms(500);
    }
    let denied = h.sentinel.check_security(&common::command(user, "calc", 1));
    // First attempt at t=0, now t=1500, window 5000 ms.
    assert_eq!(denied.retry_after_secs, Some(4));
    assert!(denied.user_message.contains("4 second(s)"));

    // An admin reset is visible to the very next check.
    let admin = common::command(1, "sentinel-admin", 0).as_admin();
    let admin = guild_sentinel::Action {
        guild_id: None,
        ..admin
    };
    assert!(matches!(
        h.sentinel
            .execute_admin(&admin, AdminCommand::ResetRateLimits(UserId(user))),
        AdminOutcome::Done
    ));
    assert!(h.sentinel.check_security(&common::command(user, "calc", 1)).allowed);
    assert_eq!(h.memory.count(EventKind::RateLimitsReset), 1);
}

#[test]
fn test_repeated_offences_flag_then_recommend_ban() {
    let h = common::harness(SentinelConfig::default());
    let offender = 66;

    for i in 0..5 {
        let action = common::command(offender, "info", 1)
            .with_arg("sujet", format!("<script>payload {i}</script>"));
        let verdict = h.sentinel.check_security(&action);
        assert!(matches!(verdict.denial, Some(Denial::ValidationRejected { .. })));
        h.clock.advance_ms(11_000);
    }

    assert_eq!(h.memory.count(EventKind::InjectionAttempt), 5);
    assert!(h.memory.count(EventKind::UserFlagged) >= 1);
    assert_eq!(h.memory.count(EventKind::BanRecommended), 1);
    assert!(h
        .sentinel
        .gate()
        .is_user_suspicious(UserId(offender), "regular name"));

    let admin = guild_sentinel::Action::new(UserId(1), "sentinel-admin").as_admin();
    match h.sentinel.execute_admin(&admin, AdminCommand::Report) {
        AdminOutcome::Report(report) => {
            assert_eq!(report.ban_recommended.len(), 1);
            assert_eq!(report.ban_recommended[0].user_id, UserId(offender));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn test_non_admin_cannot_use_admin_surface() {
    let h = common::harness(SentinelConfig::default());
    let caller = guild_sentinel::Action::new(UserId(9), "sentinel-admin");
    let outcome = h.sentinel.execute_admin(&caller, AdminCommand::Report);
    match outcome {
        AdminOutcome::Denied(verdict) => {
            assert!(matches!(verdict.denial, Some(Denial::Unauthorized { .. })));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    // Any action name still requires admin rights.
    let caller = guild_sentinel::Action::new(UserId(9), "ping");
    assert!(matches!(
        h.sentinel.execute_admin(&caller, AdminCommand::Unlock(GuildId(1))),
        AdminOutcome::Denied(_)
    ));
}

#[test]
fn test_unlock_from_outside_the_guild() {
    let h = common::harness(SentinelConfig::default());
    let guild = GuildId(3);
    h.sentinel.anti_raid().enable_lockdown(guild);

    let inside = common::command(1, "sentinel-admin", 3).as_admin();
    assert!(matches!(
        h.sentinel.execute_admin(&inside, AdminCommand::Unlock(guild)),
        AdminOutcome::Denied(_)
    ));

    let outside = guild_sentinel::Action::new(UserId(1), "sentinel-admin").as_admin();
    assert!(matches!(
        h.sentinel.execute_admin(&outside, AdminCommand::Unlock(guild)),
        AdminOutcome::Done
    ));
    assert!(!h.sentinel.anti_raid().is_locked(guild));
    assert_eq!(h.memory.count(EventKind::LockdownLifted), 1);
}

#[test]
fn test_message_spam_is_exact_repeats_only() {
    let h = common::harness(SentinelConfig::default());
    for i in 0..5 {
        let verdict = h
            .sentinel
            .screen_message(&common::message(1, 1, &format!("message number {i}")));
        assert!(matches!(verdict, MessageVerdict::Allow { .. }));
    }

    let verdicts: Vec<_> = (0..5)
        .map(|_| h.sentinel.screen_message(&common::message(2, 1, "same thing")))
        .collect();
    assert_eq!(verdicts[4], MessageVerdict::DeleteSpam);
    assert_eq!(h.memory.count(EventKind::SpamDetected), 1);
}

#[test]
fn test_validator_properties() {
    let validator = InputValidator::default();
    let opts = ValidateOptions::default();

    assert!(validator.validate("2+2", opts).is_ok());
    let rejection = validator.validate("eval(x)", opts).unwrap_err();
    assert!(rejection.reason.to_lowercase().contains("code"));

    for input in ["  a  **b**  ", "x\u{0007}y", r"\\_", "plain"] {
        let once = validator.sanitize(input);
        assert_eq!(validator.sanitize(&once), once);
    }
}
