//! guild-sentinel
//!
//! Replays chat-platform events through the anti-abuse pipeline and prints
//! one JSON verdict per event.
//!
//! # Architecture Overview
//!
//! ```text
//!   ND-JSON events ──▶ replay loop ──┬─ command ─▶ SecurityGate ──▶ Verdict
//!   (file / stdin)                   ├─ admin ───▶ execute_admin ─▶ AdminOutcome
//!                                    ├─ message ─▶ MessageScreen ─▶ MessageVerdict
//!                                    └─ join ────▶ JoinScreen ────▶ JoinVerdict
//!
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │ config (TOML, hot reload) · audit sinks · housekeeping loops │
//!   │ tracing logs (stderr) · Prometheus metrics (optional)        │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use guild_sentinel::config::{load_config, ConfigWatcher, SentinelConfig};
use guild_sentinel::lifecycle::{shutdown_on_ctrl_c, Housekeeper, Shutdown};
use guild_sentinel::observability::{logging, metrics};
use guild_sentinel::screen::{IncomingJoin, IncomingMessage};
use guild_sentinel::{Action, AdminCommand, Sentinel, SystemClock};

#[derive(Parser)]
#[command(name = "guild-sentinel")]
#[command(about = "Anti-abuse pipeline for chat-guild bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay newline-delimited JSON events and print verdicts
    Replay {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Event file; stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Reload the configuration file when it changes
        #[arg(short, long, requires = "config")]
        watch: bool,
    },
    /// Validate a configuration file
    CheckConfig {
        path: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayEvent {
    Command(Action),
    Message(IncomingMessage),
    Join(IncomingJoin),
    Admin {
        action: Action,
        command: AdminCommand,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckConfig { path } => Ok(check_config(&path)),
        Commands::Replay {
            config,
            input,
            watch,
        } => {
            let sentinel_config = match &config {
                Some(path) => load_config(path)?,
                None => SentinelConfig::default(),
            };
            logging::init(&sentinel_config.observability);
            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                config = ?config,
                "guild-sentinel starting"
            );

            if sentinel_config.observability.metrics_enabled {
                match sentinel_config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %sentinel_config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let updates = match (&config, watch) {
                (Some(path), true) => Some(ConfigWatcher::new(path, sentinel_config.clone())),
                _ => None,
            };
            let (_watcher, updates) = match updates {
                Some((watcher, rx)) => (Some(watcher.run()?), Some(rx)),
                None => (None, None),
            };

            let sentinel = Arc::new(Sentinel::new(&sentinel_config, SystemClock::shared())?);
            replay(sentinel, input.as_deref(), updates).await?;
            tracing::info!("Shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check_config(path: &Path) -> ExitCode {
    match load_config(path) {
        Ok(_) => {
            println!("{}: ok", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", path.display());
            ExitCode::FAILURE
        }
    }
}

async fn next_update(
    updates: &mut Option<mpsc::UnboundedReceiver<SentinelConfig>>,
) -> Option<SentinelConfig> {
    match updates {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn replay(
    sentinel: Arc<Sentinel>,
    input: Option<&Path>,
    mut updates: Option<mpsc::UnboundedReceiver<SentinelConfig>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Shutdown::new();
    let housekeeper = Housekeeper::spawn(Arc::clone(&sentinel), &shutdown);
    tokio::spawn(shutdown_on_ctrl_c(shutdown.clone()));
    let mut interrupted = shutdown.subscribe();

    let reader: Box<dyn AsyncRead + Unpin + Send> = match input {
        Some(path) => Box::new(tokio::fs::File::open(path).await?),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(reader).lines();
    let (mut processed, mut rejected) = (0usize, 0usize);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                processed += 1;
                match serde_json::from_str::<ReplayEvent>(&line) {
                    Ok(event) => println!("{}", handle(&sentinel, event)),
                    Err(e) => {
                        rejected += 1;
                        tracing::warn!(line = processed, error = %e, "Unreadable event");
                        println!("{}", json!({ "type": "error", "line": processed, "error": e.to_string() }));
                    }
                }
            }
            Some(config) = next_update(&mut updates) => {
                sentinel.reload(config);
            }
            _ = interrupted.recv() => {
                break;
            }
        }
    }

    tracing::info!(processed, rejected, "Replay finished");
    shutdown.trigger();
    housekeeper.join().await;
    Ok(())
}

fn handle(sentinel: &Sentinel, event: ReplayEvent) -> serde_json::Value {
    match event {
        ReplayEvent::Command(action) => {
            json!({ "type": "command", "verdict": sentinel.check_security(&action) })
        }
        ReplayEvent::Message(message) => {
            json!({ "type": "message", "verdict": sentinel.screen_message(&message) })
        }
        ReplayEvent::Join(join) => {
            json!({ "type": "join", "verdict": sentinel.screen_join(&join) })
        }
        ReplayEvent::Admin { action, command } => {
            json!({ "type": "admin", "outcome": sentinel.execute_admin(&action, command) })
        }
    }
}
