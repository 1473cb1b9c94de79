//! Periodic cleanup sweeps.
//!
//! Three independent loops, one per owner: rate limiter, anti-raid, incident
//! ledger. Sweeps only remove fully expired entries, so they can run at any
//! time next to foreground checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::sentinel::Sentinel;

const MIN_PERIOD: Duration = Duration::from_secs(1);

pub struct Housekeeper {
    handles: Vec<JoinHandle<()>>,
}

fn spawn_sweep<F>(
    kind: &'static str,
    period: Duration,
    shutdown: Shutdown,
    sweep: F,
) -> JoinHandle<()>
where
    F: Fn() -> usize + Send + 'static,
{
    let period = period.max(MIN_PERIOD);
    let mut stop = shutdown.subscribe();
    tokio::spawn(async move {
        if shutdown.is_triggered() {
            return;
        }
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = sweep();
                    metrics::record_housekeeping(kind, removed);
                    tracing::debug!(kind, removed, "Housekeeping sweep");
                }
                _ = stop.recv() => {
                    tracing::debug!(kind, "Housekeeping stopped");
                    break;
                }
            }
        }
    })
}

impl Housekeeper {
    /// Start the sweeps. Periods are read once; a reload does not change them.
    pub fn spawn(sentinel: Arc<Sentinel>, shutdown: &Shutdown) -> Self {
        let limiter = Arc::clone(sentinel.limiter());
        let anti_raid = Arc::clone(sentinel.anti_raid());
        let audit = Arc::clone(sentinel.audit());

        let incidents_period =
            Duration::from_secs(audit.ledger().config().cleanup_interval_secs);

        let handles = vec![
            spawn_sweep(
                "rate_limit",
                limiter.cleanup_interval(),
                shutdown.clone(),
                move || limiter.prune(),
            ),
            spawn_sweep(
                "anti_raid",
                anti_raid.cleanup_interval(),
                shutdown.clone(),
                move || anti_raid.cleanup().total(),
            ),
            spawn_sweep(
                "incidents",
                incidents_period,
                shutdown.clone(),
                move || audit.cleanup(),
            ),
        ];
        tracing::info!(loops = handles.len(), "Housekeeping started");
        Self { handles }
    }

    /// Wait for every loop to exit after shutdown was triggered.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Housekeeping task failed");
            }
        }
    }
}
