//! Concurrent load against the gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use guild_sentinel::{SentinelConfig, UserId};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_user_never_exceeds_limit() {
    let h = common::harness(SentinelConfig::default());
    let allowed = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..64 {
        let sentinel = Arc::clone(&h.sentinel);
        let allowed = Arc::clone(&allowed);
        tasks.push(tokio::spawn(async move {
            if sentinel.check_security(&common::command(1, "ping", 1)).allowed {
                allowed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Global rule: 5 per 10 s.
    assert_eq!(allowed.load(Ordering::SeqCst), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_load_performance() {
    let h = common::harness(SentinelConfig::default());
    let users = 2_000u64;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for chunk in 0..8u64 {
        let sentinel = Arc::clone(&h.sentinel);
        tasks.push(tokio::spawn(async move {
            let mut allowed = 0u64;
            for user in (chunk * users / 8)..((chunk + 1) * users / 8) {
                let action = common::command(user, "calc", user % 16)
                    .with_arg("expression", "sqrt(16) * (2 + 3)");
                if sentinel.check_security(&action).allowed {
                    allowed += 1;
                }
            }
            allowed
        }));
    }

    let mut total = 0u64;
    for task in tasks {
        total += task.await.unwrap();
    }
    let elapsed = start.elapsed();
    println!("{users} checks in {elapsed:?}");

    // Distinct users never interfere with each other.
    assert_eq!(total, users);
    assert!(elapsed < Duration::from_secs(10));
    assert_eq!(h.sentinel.limiter().tracked_keys(), (users * 2) as usize);
    assert!(h.memory.is_empty());
    assert!(h.sentinel.audit().user_stats(UserId(0)).is_none());
}
