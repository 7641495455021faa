use std::fs;
use std::path::Path;

use stalway_core::shape::parse_rows;
use stalway_core::{ItemCatalog, ItemDefinition};

use crate::{AssetError, ItemRecord};

/// Load an item catalog from the provided JSON file path.
pub fn catalog_from_file(path: &Path) -> Result<ItemCatalog, AssetError> {
    let data = fs::read_to_string(path)?;
    catalog_from_str(&data)
}

/// Load an item catalog from an in-memory JSON string.
pub fn catalog_from_str(input: &str) -> Result<ItemCatalog, AssetError> {
    let records = crate::load_items_from_str(input)?;
    let mut catalog = ItemCatalog::new();
    for record in records {
        catalog.insert(definition_from_record(record)?)?;
    }
    Ok(catalog)
}

fn definition_from_record(record: ItemRecord) -> Result<ItemDefinition, AssetError> {
    let shape = parse_rows(&record.shape).map_err(|source| AssetError::Shape {
        name: record.name.clone(),
        source,
    })?;
    let mut definition = ItemDefinition::new(record.id, record.name, shape);
    definition.name_translate_key = record.name_translate_key;
    definition.description_translate_key = record.description_translate_key;
    definition.inventory_sprite = record.inventory_sprite;
    definition.model = record.model;
    definition.weight = record.weight;
    if let Some(max_stack) = record.max_stack {
        definition.max_stack = max_stack;
    }
    definition.weapon = record.weapon;
    Ok(definition)
}
