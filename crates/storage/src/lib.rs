//! Grid inventory storage: shaped items placed on a rectangular grid.

mod error;
mod slots;
mod storage;
mod stored_item;

pub use error::StorageError;
pub use slots::{SlotId, Slots};
pub use storage::{Placement, Storage};
pub use stored_item::StoredItem;
