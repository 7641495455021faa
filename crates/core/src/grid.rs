//! Flat-backed two-dimensional grid.
//!
//! Cells are stored row-major in a single buffer, so `(x, y)` lives at
//! `y * width + x`. The buffer length always equals `width * height`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use thiserror::Error;

/// Upper bound on the number of cells a grid may hold.
///
/// Keeps a corrupt size (or a hostile one read off the wire) from turning
/// into a multi-gigabyte allocation.
pub const MAX_GRID_CELLS: usize = 1 << 20;

/// Errors produced by grid construction and checked access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width/height pair cannot back a grid.
    #[error("invalid grid dimensions {width}x{height} (max {MAX_GRID_CELLS} cells)")]
    DimensionInvalid {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },
    /// Coordinates outside the grid.
    #[error("cell ({x}, {y}) is outside a {width}x{height} grid")]
    IndexOutOfRange {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
    /// Buffer length does not match the declared dimensions.
    #[error("buffer of {len} cells cannot back a {width}x{height} grid")]
    BufferMismatch {
        /// Supplied buffer length.
        len: usize,
        /// Declared width.
        width: usize,
        /// Declared height.
        height: usize,
    },
}

// Each side is bounded on its own too, so a degenerate `usize::MAX x 0`
// grid cannot exist.
fn checked_area(width: usize, height: usize) -> Result<usize, GridError> {
    if width > MAX_GRID_CELLS || height > MAX_GRID_CELLS {
        return Err(GridError::DimensionInvalid { width, height });
    }
    match width.checked_mul(height) {
        Some(area) if area <= MAX_GRID_CELLS => Ok(area),
        _ => Err(GridError::DimensionInvalid { width, height }),
    }
}

/// Rectangular container of `width * height` cells.
///
/// Deserialization goes through [`Grid::from_vec`], so a buffer that does not
/// match its dimensions is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "RawGrid<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

#[derive(Deserialize)]
struct RawGrid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = GridError;

    fn try_from(raw: RawGrid<T>) -> Result<Self, Self::Error> {
        Grid::from_vec(raw.data, raw.width, raw.height)
    }
}

impl<T> Default for Grid<T> {
    /// An empty 0x0 grid.
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl<T: Clone + Default> Grid<T> {
    /// Create a grid filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        Self::filled(width, height, T::default())
    }

    /// Resize in place, keeping the overlapping top-left rectangle.
    ///
    /// New cells read as `T::default()`.
    pub fn resize(&mut self, new_width: usize, new_height: usize) -> Result<(), GridError> {
        self.resize_with_value(new_width, new_height, T::default())
    }
}

impl<T: Clone> Grid<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Result<Self, GridError> {
        let area = checked_area(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![value; area],
        })
    }

    /// Resize in place, filling new cells with `value`.
    pub fn resize_with_value(
        &mut self,
        new_width: usize,
        new_height: usize,
        value: T,
    ) -> Result<(), GridError> {
        if new_width == self.width && new_height == self.height {
            return Ok(());
        }

        let area = checked_area(new_width, new_height)?;
        let copy_width = self.width.min(new_width);
        let copy_height = self.height.min(new_height);

        let mut data = Vec::with_capacity(area);
        for y in 0..new_height {
            if y < copy_height {
                let row = y * self.width;
                data.extend_from_slice(&self.data[row..row + copy_width]);
                data.extend(std::iter::repeat_n(value.clone(), new_width - copy_width));
            } else {
                data.extend(std::iter::repeat_n(value.clone(), new_width));
            }
        }

        self.data = data;
        self.width = new_width;
        self.height = new_height;
        Ok(())
    }

    /// Build a grid from rows of equal length (`rows[y][x]`).
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let area = checked_area(width, height)?;

        let mut data = Vec::with_capacity(area);
        for row in rows {
            if row.len() != width {
                return Err(GridError::BufferMismatch {
                    len: data.len() + row.len(),
                    width,
                    height,
                });
            }
            data.extend(row);
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Copy the grid out as rows (`rows[y][x]`).
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        if self.width == 0 {
            return vec![Vec::new(); self.height];
        }
        self.data.chunks(self.width).map(<[T]>::to_vec).collect()
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer.
    pub fn from_vec(data: Vec<T>, width: usize, height: usize) -> Result<Self, GridError> {
        let area = checked_area(width, height)?;
        if data.len() != area {
            return Err(GridError::BufferMismatch {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when signed coordinates address a cell of this grid.
    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Borrow a cell.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        self.offset(x, y).map(|i| &self.data[i])
    }

    /// Mutably borrow a cell.
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        self.offset(x, y).map(move |i| &mut self.data[i])
    }

    /// Overwrite a cell.
    pub fn set(&mut self, x: usize, y: usize, value: T) -> Result<(), GridError> {
        let (width, height) = (self.width, self.height);
        match self.get_mut(x, y) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(GridError::IndexOutOfRange {
                x,
                y,
                width,
                height,
            }),
        }
    }

    /// Regenerate every cell from its coordinates.
    pub fn fill_with(&mut self, mut generator: impl FnMut(usize, usize) -> T) {
        let width = self.width;
        for (i, cell) in self.data.iter_mut().enumerate() {
            *cell = generator(i % width, i / width);
        }
    }

    /// Row-major view of the backing buffer.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over cell values in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Iterate over `(x, y, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, value)| (i % width, i / width, value))
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    fn index(&self, (x, y): (usize, usize)) -> &T {
        match self.offset(x, y) {
            Some(i) => &self.data[i],
            None => panic!(
                "cell ({x}, {y}) is outside a {}x{} grid",
                self.width, self.height
            ),
        }
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let (width, height) = (self.width, self.height);
        match self.offset(x, y) {
            Some(i) => &mut self.data[i],
            None => panic!("cell ({x}, {y}) is outside a {width}x{height} grid"),
        }
    }
}

impl<T: fmt::Display> fmt::Display for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                if x > 0 {
                    f.write_str("\t")?;
                }
                write!(f, "{}", self.data[y * self.width + x])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
