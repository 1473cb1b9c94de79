//! Configuration file watcher for hot reload.
//!
//! Editors often emit several events per save, so a reload is only forwarded
//! when a section actually differs from the configuration last sent.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::SentinelConfig;

/// Names of the top-level sections that differ between `old` and `new`.
pub fn changed_sections(old: &SentinelConfig, new: &SentinelConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if old.rate_limit != new.rate_limit {
        changed.push("rate_limit");
    }
    if old.anti_raid != new.anti_raid {
        changed.push("anti_raid");
    }
    if old.validation != new.validation {
        changed.push("validation");
    }
    if old.gate != new.gate {
        changed.push("gate");
    }
    if old.incidents != new.incidents {
        changed.push("incidents");
    }
    if old.audit != new.audit {
        changed.push("audit");
    }
    if old.observability != new.observability {
        changed.push("observability");
    }
    changed
}

/// Sections whose changes only take effect on restart.
const RESTART_ONLY: &[&str] = &["audit", "observability"];

/// Watches the configuration file and forwards changed configurations.
pub struct ConfigWatcher {
    path: PathBuf,
    current: SentinelConfig,
    update_tx: mpsc::UnboundedSender<SentinelConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration already in force.
    pub fn new(
        path: &Path,
        current: SentinelConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SentinelConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(new_config) => {
                            let changed = changed_sections(&current, &new_config);
                            if changed.is_empty() {
                                tracing::debug!(path = ?path, "Config file touched, nothing changed");
                                return;
                            }
                            let restart_only: Vec<_> = changed
                                .iter()
                                .filter(|s| RESTART_ONLY.contains(s))
                                .collect();
                            if !restart_only.is_empty() {
                                tracing::warn!(
                                    sections = ?restart_only,
                                    "Changed sections only apply after a restart"
                                );
                            }
                            tracing::info!(path = ?path, sections = ?changed, "Config reloaded");
                            current = new_config.clone();
                            let _ = update_tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(
                                error = %e,
                                "Failed to reload config, keeping current configuration"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}
