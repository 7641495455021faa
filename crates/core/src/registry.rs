//! Item catalog and the read-only repository seam.
//!
//! Storages never reach for a global item table. Whoever builds a storage
//! (or decodes one off the wire) injects an [`ItemRepository`]; the catalog
//! below is the in-memory implementation loaded from item packs.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::item::{ItemDefinition, ItemId};

/// Read-only lookup of item definitions by id.
pub trait ItemRepository: Send + Sync {
    /// Resolve an item definition.
    fn item(&self, id: ItemId) -> Option<Arc<ItemDefinition>>;
}

/// Errors emitted while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two definitions share an id.
    #[error("duplicate item id {id} ({existing:?} and {duplicate:?})")]
    DuplicateId {
        /// Conflicting id.
        id: ItemId,
        /// Name already registered.
        existing: String,
        /// Name that was rejected.
        duplicate: String,
    },
    /// A shape with no covered cell could be "placed" anywhere, on top of anything.
    #[error("item {id} ({name:?}) has an empty shape")]
    EmptyShape {
        /// Item id.
        id: ItemId,
        /// Item name.
        name: String,
    },
}

/// Item definitions keyed by id.
///
/// Uses BTreeMap so iteration order is deterministic.
#[derive(Debug, Default, Clone)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, Arc<ItemDefinition>>,
    name_to_id: HashMap<String, ItemId>,
}

impl ItemCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from definitions, rejecting the first invalid one.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = ItemDefinition>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition)?;
        }
        Ok(catalog)
    }

    /// Register a definition.
    pub fn insert(
        &mut self,
        definition: ItemDefinition,
    ) -> Result<Arc<ItemDefinition>, CatalogError> {
        if definition.cell_count() == 0 {
            return Err(CatalogError::EmptyShape {
                id: definition.id,
                name: definition.name,
            });
        }
        if let Some(existing) = self.items.get(&definition.id) {
            return Err(CatalogError::DuplicateId {
                id: definition.id,
                existing: existing.name.clone(),
                duplicate: definition.name,
            });
        }

        let definition = Arc::new(definition);
        self.name_to_id.insert(definition.name.clone(), definition.id);
        self.items.insert(definition.id, Arc::clone(&definition));
        Ok(definition)
    }

    /// Look up a definition by id.
    pub fn get(&self, id: ItemId) -> Option<&Arc<ItemDefinition>> {
        self.items.get(&id)
    }

    /// Resolve an item id by its name.
    pub fn id_by_name(&self, name: &str) -> Option<ItemId> {
        self.name_to_id.get(name).copied()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemDefinition>> + '_ {
        self.items.values()
    }
}

impl ItemRepository for ItemCatalog {
    fn item(&self, id: ItemId) -> Option<Arc<ItemDefinition>> {
        self.items.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::rectangle;
    use crate::Grid;

    #[test]
    fn lookup_by_id_and_name() {
        let catalog = ItemCatalog::from_definitions([
            ItemDefinition::new(7, "ammo", rectangle(1, 1).unwrap()),
            ItemDefinition::new(3, "medkit", rectangle(2, 2).unwrap()),
        ])
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.id_by_name("medkit"), Some(3));
        assert_eq!(catalog.item(7).unwrap().name, "ammo");
        assert!(catalog.item(99).is_none());

        let ids: Vec<_> = catalog.iter().map(|def| def.id).collect();
        assert_eq!(ids, vec![3, 7]);
    }

    #[test]
    fn rejects_duplicates() {
        let err = ItemCatalog::from_definitions([
            ItemDefinition::new(1, "a", rectangle(1, 1).unwrap()),
            ItemDefinition::new(1, "b", rectangle(1, 1).unwrap()),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateId {
                id: 1,
                existing: "a".into(),
                duplicate: "b".into()
            }
        );
    }

    #[test]
    fn rejects_empty_shapes() {
        let mut catalog = ItemCatalog::new();
        let hollow = Grid::filled(2, 2, false).unwrap();
        assert!(matches!(
            catalog.insert(ItemDefinition::new(1, "ghost", hollow)),
            Err(CatalogError::EmptyShape { id: 1, .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn repository_is_object_safe() {
        let catalog = ItemCatalog::from_definitions([ItemDefinition::new(
            1,
            "ammo",
            rectangle(1, 1).unwrap(),
        )])
        .unwrap();
        let repo: Arc<dyn ItemRepository> = Arc::new(catalog);
        assert!(repo.item(1).is_some());
    }
}
