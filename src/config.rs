use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stalway_assets::{catalog_from_file, catalog_from_str};
use stalway_core::ItemCatalog;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_SIM_PATH: &str = "config/sim.toml";
const DEFAULT_ITEMS_PATH: &str = "config/items.json";
const BUILTIN_ITEMS: &str = include_str!("../config/items.json");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    /// Storage width in cells.
    pub width: usize,
    /// Storage height in cells.
    pub height: usize,
    /// Number of sync rounds.
    pub rounds: u64,
    /// Host operations attempted per round.
    pub ops_per_round: u32,
    /// Seed for the operation generator.
    pub seed: u64,
    /// Item pack; the bundled pack is used when unset.
    pub items: Option<PathBuf>,
    /// Round in which the second replica bootstraps from a snapshot.
    pub late_join_round: u64,
    /// JSONL file receiving every host operation; disabled when unset.
    pub event_log: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 6,
            rounds: 50,
            ops_per_round: 8,
            seed: 0x5EED,
            items: None,
            late_join_round: 5,
            event_log: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SimConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SimConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_SIM_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!("Sim config not found at {}. Using defaults", path.display());
                }
                SimConfig::default()
            }
        }
    }
}

/// Load the item catalog.
///
/// An explicitly configured pack must load; the default pack falls back to
/// the bundled copy.
pub fn load_item_catalog(path: Option<&Path>) -> Result<ItemCatalog> {
    if let Some(path) = path {
        return catalog_from_file(path)
            .with_context(|| format!("Failed to load item pack {}", path.display()));
    }

    let default_path = Path::new(DEFAULT_ITEMS_PATH);
    match catalog_from_file(default_path) {
        Ok(catalog) => Ok(catalog),
        Err(err) => {
            warn!(
                "Failed to load {}: {err}. Using bundled item pack",
                default_path.display()
            );
            catalog_from_str(BUILTIN_ITEMS).context("Bundled item pack is invalid")
        }
    }
}
