//! stalway-sim - headless replication run for grid inventory storages
//!
//! Drives an owner storage with random operations and checks every round that
//! a live replica and a late-joining replica reach the owner's state.

mod config;
mod headless;

use anyhow::Result;
use config::{load_item_catalog, SimConfig, DEFAULT_SIM_PATH};
use std::{env, path::PathBuf};
use tracing::info;

fn main() -> Result<()> {
    // Initialize tracing with INFO level by default (can be overridden via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting stalway-sim v{}", env!("CARGO_PKG_VERSION"));

    let cli = CliOptions::parse(env::args().skip(1));
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SIM_PATH));
    let mut cfg = SimConfig::load_from_path(&config_path);
    cli.apply(&mut cfg);

    let catalog = load_item_catalog(cfg.items.as_deref())?;
    info!(
        width = cfg.width,
        height = cfg.height,
        rounds = cfg.rounds,
        seed = cfg.seed,
        items = catalog.len(),
        "running"
    );

    let summary = headless::run(&cfg, catalog)?;
    info!(
        rounds = summary.rounds,
        operations = summary.operations,
        rejected = summary.rejected,
        applied = summary.applied,
        skipped = summary.skipped,
        items = summary.final_items,
        digest = %summary.digest,
        "replicas converged"
    );
    Ok(())
}

#[derive(Debug, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    seed: Option<u64>,
    rounds: Option<u64>,
    items: Option<PathBuf>,
    event_log: Option<PathBuf>,
}

impl CliOptions {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Self {
        let mut opts = CliOptions::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    if let Some(path) = args.next() {
                        opts.config = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--config requires a file path");
                    }
                }
                "--items" => {
                    if let Some(path) = args.next() {
                        opts.items = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--items requires a file path");
                    }
                }
                "--event-log" => {
                    if let Some(path) = args.next() {
                        opts.event_log = Some(PathBuf::from(path));
                    } else {
                        tracing::error!("--event-log requires a file path");
                    }
                }
                "--seed" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.seed = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--seed must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--seed requires an integer");
                    }
                }
                "--rounds" => {
                    if let Some(raw) = args.next() {
                        match raw.parse::<u64>() {
                            Ok(value) => opts.rounds = Some(value),
                            Err(err) => {
                                tracing::error!(%err, value = %raw, "--rounds must be an integer");
                            }
                        }
                    } else {
                        tracing::error!("--rounds requires an integer");
                    }
                }
                other => tracing::warn!(arg = other, "ignoring unknown argument"),
            }
        }

        opts
    }

    /// Command-line flags win over the config file.
    fn apply(&self, cfg: &mut SimConfig) {
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(rounds) = self.rounds {
            cfg.rounds = rounds;
        }
        if let Some(items) = &self.items {
            cfg.items = Some(items.clone());
        }
        if let Some(log) = &self.event_log {
            cfg.event_log = Some(log.clone());
        }
    }
}
