#![warn(missing_docs)]
//! Item pack schema + validation helpers.

mod loader;

pub use loader::{catalog_from_file, catalog_from_str};

use serde::Deserialize;
use stalway_core::shape::ShapeParseError;
use stalway_core::{CatalogError, ItemId, WeaponProperties};
use thiserror::Error;

/// Item entry as written in a pack.
#[derive(Debug, Deserialize)]
pub struct ItemRecord {
    /// Catalog identifier.
    pub id: ItemId,
    /// Human-readable identifier (e.g., "medkit").
    pub name: String,
    /// Localization key for the display name.
    #[serde(default)]
    pub name_translate_key: String,
    /// Localization key for the description.
    #[serde(default)]
    pub description_translate_key: String,
    /// Sprite asset shown in inventory views.
    #[serde(default)]
    pub inventory_sprite: String,
    /// World model asset.
    #[serde(default)]
    pub model: String,
    /// Weight in kilograms.
    #[serde(default)]
    pub weight: f32,
    /// Maximum units per stack (defaults to 1).
    #[serde(default)]
    pub max_stack: Option<u32>,
    /// Shape rows, `#` for covered cells and `.` for empty ones.
    pub shape: Vec<String>,
    /// Weapon capability; omitted fields take the stock defaults.
    #[serde(default)]
    pub weapon: Option<WeaponProperties>,
}

/// Errors emitted during pack loading.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Wrap IO errors when reading packs.
    #[error("failed to read item pack: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap serde parsing issues.
    #[error("failed to parse item pack: {0}")]
    Parse(#[from] serde_json::Error),
    /// Shape rows that do not form a grid.
    #[error("invalid shape for item {name:?}: {source}")]
    Shape {
        /// Item name.
        name: String,
        /// Underlying error.
        source: ShapeParseError,
    },
    /// Pack contents rejected by the catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Parse a JSON string into a list of item records.
pub fn load_items_from_str(input: &str) -> Result<Vec<ItemRecord>, AssetError> {
    Ok(serde_json::from_str(input)?)
}
