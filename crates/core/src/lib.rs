#![warn(missing_docs)]
//! Core primitives shared across the workspace: grids, shapes, rotations and
//! item definitions.

pub mod grid;
pub mod item;
pub mod registry;
pub mod rotation;
pub mod shape;

// Re-export commonly used types
pub use grid::{Grid, GridError, MAX_GRID_CELLS};
pub use item::{
    AutomaticType, DamageTypes, ItemDefinition, ItemId, ReloadType, ShootType, WeaponProperties,
};
pub use registry::{CatalogError, ItemCatalog, ItemRepository};
pub use rotation::{rotated_size, Rotation};
pub use shape::{GridPos, Shape};
