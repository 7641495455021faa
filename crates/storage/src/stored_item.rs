use std::sync::Arc;

use stalway_core::shape::{self, Shape};
use stalway_core::{GridPos, ItemDefinition, Rotation};

/// An item instance placed in a storage.
#[derive(Debug, Clone)]
pub struct StoredItem {
    item: Arc<ItemDefinition>,
    position: GridPos,
    rotation: Rotation,
    /// `item.shape` rotated by `rotation`, cached for occupancy checks.
    shape: Shape,
}

impl StoredItem {
    /// Create a stored item, computing its rotated shape.
    pub fn new(item: Arc<ItemDefinition>, position: GridPos, rotation: Rotation) -> Self {
        let shape = item.shape.rotated(rotation);
        Self::with_shape(item, position, rotation, shape)
    }

    pub(crate) fn with_shape(
        item: Arc<ItemDefinition>,
        position: GridPos,
        rotation: Rotation,
        shape: Shape,
    ) -> Self {
        Self {
            item,
            position,
            rotation,
            shape,
        }
    }

    /// Shared item definition.
    pub fn item(&self) -> &Arc<ItemDefinition> {
        &self.item
    }

    /// Top-left anchor.
    pub fn position(&self) -> GridPos {
        self.position
    }

    /// Current orientation.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Rotated shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Absolute cells covered by this item.
    pub fn footprint(&self) -> impl Iterator<Item = GridPos> + '_ {
        shape::footprint(&self.shape, self.position)
    }

    /// Move/rotate; the shape is recached only when the rotation changes.
    ///
    /// `rotated` may carry the already computed shape for `rotation`.
    pub(crate) fn set_placement(
        &mut self,
        position: GridPos,
        rotation: Rotation,
        rotated: Option<Shape>,
    ) {
        self.position = position;
        if self.rotation != rotation {
            self.rotation = rotation;
            self.shape = rotated.unwrap_or_else(|| self.item.shape.rotated(rotation));
        }
    }
}
