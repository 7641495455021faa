use stalway_core::{GridError, GridPos, ItemId, Rotation};
use thiserror::Error;

use crate::SlotId;

/// Failures reported by storage operations.
///
/// Placement and index failures are ordinary outcomes (a UI probing candidate
/// cells hits them constantly) and leave the storage untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Shape overlaps another item or leaves the grid.
    #[error("cannot place shape at {position} facing {rotation:?}")]
    PlacementRejected {
        /// Requested anchor.
        position: GridPos,
        /// Requested rotation.
        rotation: Rotation,
    },
    /// No anchor and rotation fits the item anywhere.
    #[error("no free space for item {item}")]
    NoFreeSpace {
        /// Item that was offered.
        item: ItemId,
    },
    /// Slot does not hold an item.
    #[error("no stored item in slot {slot}")]
    IndexOutOfRange {
        /// Requested slot.
        slot: SlotId,
    },
    /// Shrinking would leave an item partly outside the grid.
    #[error("resize to {width}x{height} would orphan the item in slot {slot}")]
    ResizeOrphansItems {
        /// First item that would no longer fit.
        slot: SlotId,
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
    /// Places grid and item list disagree.
    #[error("inconsistent storage state: {0}")]
    Inconsistent(String),
    /// Invalid dimensions or grid access.
    #[error(transparent)]
    Grid(#[from] GridError),
}
