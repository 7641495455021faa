//! Item shapes and grid positions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::{Grid, GridError};

/// Boolean occupancy mask of an item, relative to its top-left anchor.
pub type Shape = Grid<bool>;

/// Signed cell coordinate inside a storage grid.
///
/// Signed so that probes hanging off the left/top edge are representable
/// (and rejected) instead of wrapping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Top-left corner.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a relative shape cell.
    pub fn offset(self, dx: usize, dy: usize) -> Option<Self> {
        let x = i32::try_from(dx).ok()?.checked_add(self.x)?;
        let y = i32::try_from(dy).ok()?.checked_add(self.y)?;
        Some(Self { x, y })
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Relative `(dx, dy)` of every covered cell, row-major.
pub fn occupied(shape: &Shape) -> impl Iterator<Item = (usize, usize)> + '_ {
    shape
        .cells()
        .filter_map(|(x, y, &covered)| covered.then_some((x, y)))
}

/// Number of covered cells.
pub fn cell_count(shape: &Shape) -> usize {
    shape.iter().filter(|&&covered| covered).count()
}

/// Absolute cells covered by `shape` anchored at `position`.
///
/// Cells whose coordinates overflow `i32` are dropped; they can never be in
/// bounds of a storage anyway.
pub fn footprint(shape: &Shape, position: GridPos) -> impl Iterator<Item = GridPos> + '_ {
    occupied(shape).filter_map(move |(dx, dy)| position.offset(dx, dy))
}

/// Error from [`parse_rows`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeParseError {
    /// A character other than `#` or `.`.
    #[error("unexpected character {found:?} at row {row}, column {column}")]
    InvalidCell {
        /// Offending character.
        found: char,
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },
    /// Rows of differing length or an oversized mask.
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Parse a shape from text rows, `#` for covered and `.` for empty.
///
/// ```
/// use stalway_core::shape::{cell_count, parse_rows};
///
/// let l_shape = parse_rows(&["#.", "#.", "##"]).unwrap();
/// assert_eq!((l_shape.width(), l_shape.height()), (2, 3));
/// assert_eq!(cell_count(&l_shape), 4);
/// ```
pub fn parse_rows<S: AsRef<str>>(rows: &[S]) -> Result<Shape, ShapeParseError> {
    let mut parsed = Vec::with_capacity(rows.len());
    for (row, line) in rows.iter().enumerate() {
        let cells = line
            .as_ref()
            .chars()
            .enumerate()
            .map(|(column, c)| match c {
                '#' => Ok(true),
                '.' => Ok(false),
                found => Err(ShapeParseError::InvalidCell { found, row, column }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        parsed.push(cells);
    }
    Ok(Grid::from_rows(parsed)?)
}

/// Solid `width x height` rectangle.
pub fn rectangle(width: usize, height: usize) -> Result<Shape, GridError> {
    Grid::filled(width, height, true)
}
