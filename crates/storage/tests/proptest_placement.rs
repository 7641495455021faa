//! Property-based tests for storage placement
//!
//! Validates occupancy invariants under arbitrary operation sequences:
//! - Places always equals the union of stored footprints
//! - Place followed by remove restores the grid
//! - Successful resizes never move items
//! - Rebuilt storages allocate slots like the original

use std::sync::Arc;

use proptest::prelude::*;
use stalway_core::{GridPos, ItemCatalog, ItemDefinition, Rotation};
use stalway_storage::{SlotId, Storage};
use stalway_testkit::{check_storage, sample_catalog};

#[derive(Debug, Clone)]
enum Op {
    Place { item: u32, x: i32, y: i32, rot: u8 },
    TryPlace { item: u32 },
    Remove { slot: u32 },
    Replace { slot: u32, x: i32, y: i32, rot: u8 },
    Resize { width: usize, height: usize },
    Clear,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1u32..=6, -1i32..8, -1i32..8, 0u8..4)
            .prop_map(|(item, x, y, rot)| Op::Place { item, x, y, rot }),
        3 => (1u32..=6).prop_map(|item| Op::TryPlace { item }),
        2 => (0u32..10).prop_map(|slot| Op::Remove { slot }),
        2 => (0u32..10, -1i32..8, -1i32..8, 0u8..4)
            .prop_map(|(slot, x, y, rot)| Op::Replace { slot, x, y, rot }),
        1 => (1usize..9, 1usize..9).prop_map(|(width, height)| Op::Resize { width, height }),
        1 => Just(Op::Clear),
    ]
}

fn rotation(value: u8) -> Rotation {
    Rotation::from_u8(value).unwrap_or_default()
}

fn def(catalog: &ItemCatalog, id: u32) -> Arc<ItemDefinition> {
    catalog.get(id).cloned().expect("fixture item")
}

fn apply(storage: &mut Storage, catalog: &ItemCatalog, op: &Op) {
    let _ = match *op {
        Op::Place { item, x, y, rot } => storage
            .place_item(def(catalog, item), GridPos::new(x, y), rotation(rot))
            .map(|_| ()),
        Op::TryPlace { item } => storage.try_place_item(def(catalog, item)).map(|_| ()),
        Op::Remove { slot } => storage.remove_item(SlotId(slot)).map(|_| ()),
        Op::Replace { slot, x, y, rot } => {
            storage.replace_item(SlotId(slot), GridPos::new(x, y), rotation(rot))
        }
        Op::Resize { width, height } => storage.resize(width, height),
        Op::Clear => {
            storage.clear();
            Ok(())
        }
    };
}

proptest! {
    /// Property: occupancy matches stored footprints after any sequence
    #[test]
    fn places_match_items_after_any_sequence(
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let catalog = sample_catalog().unwrap();
        let mut storage = Storage::new(6, 5).unwrap();

        for op in &ops {
            apply(&mut storage, &catalog, op);
            prop_assert!(storage.validate().is_ok(), "validate failed after {:?}", op);
            if let Err(err) = check_storage(&storage) {
                return Err(TestCaseError::fail(format!("after {op:?}: {err:#}")));
            }
        }
    }

    /// Property: place then remove is the identity on the places grid
    #[test]
    fn place_then_remove_restores_grid(
        setup in prop::collection::vec(op_strategy(), 0..20),
        item in 1u32..=6,
        x in 0i32..6,
        y in 0i32..5,
        rot in 0u8..4,
    ) {
        let catalog = sample_catalog().unwrap();
        let mut storage = Storage::new(6, 5).unwrap();
        for op in &setup {
            apply(&mut storage, &catalog, op);
        }

        let before = storage.places().clone();
        let count = storage.item_count();
        if let Ok(slot) = storage.place_item(def(&catalog, item), GridPos::new(x, y), rotation(rot)) {
            prop_assert_eq!(storage.item_count(), count + 1);
            storage.remove_item(slot).unwrap();
        }
        prop_assert_eq!(storage.places(), &before);
        prop_assert_eq!(storage.item_count(), count);
    }

    /// Property: a resize either fails without effect or keeps every item in place
    #[test]
    fn resize_never_moves_items(
        setup in prop::collection::vec(op_strategy(), 0..30),
        width in 1usize..10,
        height in 1usize..10,
    ) {
        let catalog = sample_catalog().unwrap();
        let mut storage = Storage::new(6, 5).unwrap();
        for op in &setup {
            apply(&mut storage, &catalog, op);
        }

        let before: Vec<_> = storage
            .items()
            .map(|(slot, stored)| (slot, stored.position(), stored.rotation()))
            .collect();
        let dims = (storage.width(), storage.height());

        match storage.resize(width, height) {
            Ok(()) => prop_assert_eq!((storage.width(), storage.height()), (width, height)),
            Err(_) => prop_assert_eq!((storage.width(), storage.height()), dims),
        }
        let after: Vec<_> = storage
            .items()
            .map(|(slot, stored)| (slot, stored.position(), stored.rotation()))
            .collect();
        prop_assert_eq!(before, after);
        prop_assert!(check_storage(&storage).is_ok());
    }

    /// Property: a storage rebuilt from its parts places new items identically
    #[test]
    fn rebuilt_storage_allocates_like_original(
        setup in prop::collection::vec(op_strategy(), 0..30),
        next in prop::collection::vec(1u32..=6, 1..6),
    ) {
        let catalog = sample_catalog().unwrap();
        let mut original = Storage::new(6, 5).unwrap();
        for op in &setup {
            apply(&mut original, &catalog, op);
        }
        let mut rebuilt = Storage::from_parts(
            original.places().clone(),
            original.slots().entries().to_vec(),
        )
        .unwrap();

        for item in next {
            let a = original.try_place_item(def(&catalog, item));
            let b = rebuilt.try_place_item(def(&catalog, item));
            prop_assert_eq!(a, b);
        }
        prop_assert_eq!(original.places(), rebuilt.places());
    }
}
