//! Grid inventory: the places grid plus the items placed on it.
//!
//! Every covered cell of every stored item maps back to that item's slot, and
//! every occupied cell belongs to exactly one stored item. All operations keep
//! this invariant and leave the storage untouched when they fail.

use std::sync::Arc;

use stalway_core::shape::{self, Shape};
use stalway_core::{Grid, GridPos, ItemDefinition, Rotation};
use tracing::{debug, trace};

use crate::{SlotId, Slots, StorageError, StoredItem};

/// Result of an automatic placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Slot the item now lives in.
    pub slot: SlotId,
    /// Chosen anchor.
    pub position: GridPos,
    /// Chosen rotation.
    pub rotation: Rotation,
}

/// Rectangular item storage.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    places: Grid<Option<SlotId>>,
    items: Slots<StoredItem>,
}

impl Storage {
    /// Create an empty storage of `width` x `height` cells.
    pub fn new(width: usize, height: usize) -> Result<Self, StorageError> {
        Ok(Self {
            places: Grid::new(width, height)?,
            items: Slots::new(),
        })
    }

    /// Rebuild a storage from decoded parts, checking every invariant.
    pub fn from_parts(
        places: Grid<Option<SlotId>>,
        entries: Vec<Option<StoredItem>>,
    ) -> Result<Self, StorageError> {
        let storage = Self {
            places,
            items: Slots::from_entries(entries),
        };
        storage.validate()?;
        Ok(storage)
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.places.width()
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.places.height()
    }

    /// Longer side.
    pub fn max_side(&self) -> usize {
        self.width().max(self.height())
    }

    /// Shorter side.
    pub fn min_side(&self) -> usize {
        self.width().min(self.height())
    }

    /// Number of cells.
    pub fn area(&self) -> usize {
        self.places.len()
    }

    /// Occupancy grid; `None` marks an empty cell.
    pub fn places(&self) -> &Grid<Option<SlotId>> {
        &self.places
    }

    /// Stored item arena, vacancies included.
    pub fn slots(&self) -> &Slots<StoredItem> {
        &self.items
    }

    /// Item stored in `slot`.
    pub fn item(&self, slot: SlotId) -> Option<&StoredItem> {
        self.items.get(slot)
    }

    /// Stored items in slot order.
    pub fn items(&self) -> impl Iterator<Item = (SlotId, &StoredItem)> + '_ {
        self.items.iter()
    }

    /// Number of stored items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Length of the slot layout, vacancies included.
    pub fn slot_count(&self) -> usize {
        self.items.slot_count()
    }

    /// True when `slot` holds an item.
    pub fn contains(&self, slot: SlotId) -> bool {
        self.items.contains(slot)
    }

    /// True when `(x, y)` is a cell of this storage.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.places.in_bounds(x, y)
    }

    /// Item covering `(x, y)`, if any.
    pub fn item_at(&self, x: i32, y: i32) -> Option<(SlotId, &StoredItem)> {
        let slot = (*cell(&self.places, GridPos::new(x, y))?)?;
        self.items.get(slot).map(|stored| (slot, stored))
    }

    /// True when every covered cell of `shape` at `position` is in bounds and empty.
    pub fn can_place(&self, shape: &Shape, position: GridPos) -> bool {
        fits(&self.places, shape, position, None)
    }

    /// Place `item` at `position` with `rotation`.
    pub fn place_item(
        &mut self,
        item: Arc<ItemDefinition>,
        position: GridPos,
        rotation: Rotation,
    ) -> Result<SlotId, StorageError> {
        let shape = item.shape.rotated(rotation);
        if !self.can_place(&shape, position) {
            return Err(StorageError::PlacementRejected { position, rotation });
        }
        Ok(self.insert(item, position, rotation, shape))
    }

    /// Remove the item in `slot` and clear its footprint.
    pub fn remove_item(&mut self, slot: SlotId) -> Result<StoredItem, StorageError> {
        let stored = self
            .items
            .remove(slot)
            .ok_or(StorageError::IndexOutOfRange { slot })?;
        mark(&mut self.places, stored.shape(), stored.position(), None);
        trace!(%slot, item = stored.item().id, "removed item");
        Ok(stored)
    }

    /// Move and/or rotate the item in `slot`.
    ///
    /// The item's current footprint does not block its new one, so an item can
    /// be nudged or turned in place.
    pub fn replace_item(
        &mut self,
        slot: SlotId,
        position: GridPos,
        rotation: Rotation,
    ) -> Result<(), StorageError> {
        let stored = self
            .items
            .get_mut(slot)
            .ok_or(StorageError::IndexOutOfRange { slot })?;

        let rotated =
            (stored.rotation() != rotation).then(|| stored.item().shape.rotated(rotation));
        let candidate = rotated.as_ref().unwrap_or_else(|| stored.shape());
        if !fits(&self.places, candidate, position, Some(slot)) {
            return Err(StorageError::PlacementRejected { position, rotation });
        }

        mark(&mut self.places, stored.shape(), stored.position(), None);
        stored.set_placement(position, rotation, rotated);
        mark(&mut self.places, stored.shape(), position, Some(slot));
        trace!(%slot, %position, ?rotation, "replaced item");
        Ok(())
    }

    /// First anchor and rotation where `item` fits.
    ///
    /// Rotations are tried in order Up, Right, Down, Left; anchors row by row,
    /// left to right.
    pub fn find_placement(&self, item: &ItemDefinition) -> Option<(GridPos, Rotation)> {
        self.search(item)
            .map(|(position, rotation, _)| (position, rotation))
    }

    /// Place `item` wherever [`Storage::find_placement`] finds room.
    pub fn try_place_item(
        &mut self,
        item: Arc<ItemDefinition>,
    ) -> Result<Placement, StorageError> {
        let (position, rotation, shape) = self
            .search(&item)
            .ok_or(StorageError::NoFreeSpace { item: item.id })?;
        let slot = self.insert(item, position, rotation, shape);
        Ok(Placement {
            slot,
            position,
            rotation,
        })
    }

    /// Change the dimensions, keeping every stored item where it is.
    ///
    /// Fails without touching anything if an item would end up outside the
    /// new bounds.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), StorageError> {
        if width == self.width() && height == self.height() {
            return Ok(());
        }

        let orphan = self.items.iter().find(|(_, stored)| {
            stored.footprint().any(|pos| {
                usize::try_from(pos.x).map_or(true, |x| x >= width)
                    || usize::try_from(pos.y).map_or(true, |y| y >= height)
            })
        });
        if let Some((slot, _)) = orphan {
            return Err(StorageError::ResizeOrphansItems {
                slot,
                width,
                height,
            });
        }

        self.places.resize(width, height)?;
        debug!(width, height, "resized storage");
        Ok(())
    }

    /// Remove every item; dimensions are kept.
    pub fn clear(&mut self) {
        self.places.fill_with(|_, _| None);
        self.items.clear();
        debug!("cleared storage");
    }

    /// Check that places and items agree.
    pub fn validate(&self) -> Result<(), StorageError> {
        let mut covered = 0usize;
        for (slot, stored) in self.items.iter() {
            let expected = stored.item().shape.rotated(stored.rotation());
            if &expected != stored.shape() {
                return Err(StorageError::Inconsistent(format!(
                    "slot {slot} caches a shape that does not match its rotation"
                )));
            }
            for (dx, dy) in shape::occupied(stored.shape()) {
                let owner = stored
                    .position()
                    .offset(dx, dy)
                    .and_then(|pos| cell(&self.places, pos));
                match owner {
                    Some(Some(owner)) if *owner == slot => covered += 1,
                    Some(Some(owner)) => {
                        return Err(StorageError::Inconsistent(format!(
                            "slot {slot} overlaps slot {owner}"
                        )))
                    }
                    Some(None) => {
                        return Err(StorageError::Inconsistent(format!(
                            "cell of slot {slot} is marked empty"
                        )))
                    }
                    None => {
                        return Err(StorageError::Inconsistent(format!(
                            "slot {slot} leaves the grid"
                        )))
                    }
                }
            }
        }

        let mut occupied = 0usize;
        for (x, y, owner) in self.places.cells() {
            if let Some(owner) = owner {
                if !self.items.contains(*owner) {
                    return Err(StorageError::Inconsistent(format!(
                        "cell ({x}, {y}) points at vacant slot {owner}"
                    )));
                }
                occupied += 1;
            }
        }
        if occupied != covered {
            return Err(StorageError::Inconsistent(format!(
                "{occupied} occupied cells but items cover {covered}"
            )));
        }
        Ok(())
    }

    fn search(&self, item: &ItemDefinition) -> Option<(GridPos, Rotation, Shape)> {
        for rotation in Rotation::ALL {
            let shape = item.shape.rotated(rotation);
            if shape.width() > self.width() || shape.height() > self.height() {
                continue;
            }
            for y in 0..=self.height() - shape.height() {
                for x in 0..=self.width() - shape.width() {
                    let position = GridPos::new(x as i32, y as i32);
                    if self.can_place(&shape, position) {
                        return Some((position, rotation, shape));
                    }
                }
            }
        }
        None
    }

    fn insert(
        &mut self,
        item: Arc<ItemDefinition>,
        position: GridPos,
        rotation: Rotation,
        shape: Shape,
    ) -> SlotId {
        let slot = self.items.next_slot();
        mark(&mut self.places, &shape, position, Some(slot));
        trace!(%slot, item = item.id, %position, ?rotation, "placed item");
        self.items
            .insert(StoredItem::with_shape(item, position, rotation, shape))
    }
}

fn cell(places: &Grid<Option<SlotId>>, pos: GridPos) -> Option<&Option<SlotId>> {
    let x = usize::try_from(pos.x).ok()?;
    let y = usize::try_from(pos.y).ok()?;
    places.get(x, y)
}

/// Covered cells of `shape` at `position` are in bounds and empty, or owned by `ignore`.
fn fits(
    places: &Grid<Option<SlotId>>,
    shape: &Shape,
    position: GridPos,
    ignore: Option<SlotId>,
) -> bool {
    shape::occupied(shape).all(|(dx, dy)| {
        match position.offset(dx, dy).and_then(|pos| cell(places, pos)) {
            Some(None) => true,
            Some(owner) => ignore.is_some() && *owner == ignore,
            None => false,
        }
    })
}

/// Write `value` into every covered cell. Callers check [`fits`] first.
fn mark(
    places: &mut Grid<Option<SlotId>>,
    shape: &Shape,
    position: GridPos,
    value: Option<SlotId>,
) {
    for pos in shape::footprint(shape, position) {
        if let (Ok(x), Ok(y)) = (usize::try_from(pos.x), usize::try_from(pos.y)) {
            if let Some(cell) = places.get_mut(x, y) {
                *cell = value;
            }
        }
    }
}
