//! Four-way rotation of grids.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;

/// Discrete orientation applied to an item shape.
///
/// Values are stable; they travel over the wire as a single byte.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum Rotation {
    /// 0°.
    #[default]
    Up = 0,
    /// 90° clockwise.
    Right = 1,
    /// 180°.
    Down = 2,
    /// 270° clockwise (90° counter-clockwise).
    Left = 3,
}

impl Rotation {
    /// All rotations in search order.
    pub const ALL: [Rotation; 4] = [Rotation::Up, Rotation::Right, Rotation::Down, Rotation::Left];

    /// Stable numeric representation.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse the stable numeric representation.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Up),
            1 => Some(Self::Right),
            2 => Some(Self::Down),
            3 => Some(Self::Left),
            _ => None,
        }
    }

    /// Clockwise angle in degrees.
    pub const fn degrees(self) -> u16 {
        self as u16 * 90
    }

    /// Next orientation, turning 90° clockwise.
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// True for the quarter turns that exchange width and height.
    pub const fn swaps_axes(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }
}

/// Dimensions of a `width x height` grid after rotation.
pub const fn rotated_size(width: usize, height: usize, rotation: Rotation) -> (usize, usize) {
    if rotation.swaps_axes() {
        (height, width)
    } else {
        (width, height)
    }
}

impl<T: Clone> Grid<T> {
    /// Produce a rotated copy of this grid.
    ///
    /// With `w x h` source dimensions, `Right` maps `src[x, y]` to
    /// `dst[h-1-y, x]`, `Down` to `dst[w-1-x, h-1-y]` and `Left` to
    /// `dst[y, w-1-x]`.
    pub fn rotated(&self, rotation: Rotation) -> Grid<T> {
        let (w, h) = (self.width(), self.height());
        let (rw, rh) = rotated_size(w, h, rotation);
        let src = self.as_slice();

        let mut data = Vec::with_capacity(src.len());
        for ry in 0..rh {
            for rx in 0..rw {
                let (x, y) = match rotation {
                    Rotation::Up => (rx, ry),
                    Rotation::Right => (ry, h - 1 - rx),
                    Rotation::Down => (w - 1 - rx, h - 1 - ry),
                    Rotation::Left => (w - 1 - ry, rx),
                };
                data.push(src[y * w + x].clone());
            }
        }

        match Grid::from_vec(data, rw, rh) {
            Ok(grid) => grid,
            // Same cell count as `self`, which already passed the size checks.
            Err(err) => unreachable!("rotation changed grid area: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid<u8> {
        // 3 wide, 2 tall:
        // 1 2 3
        // 4 5 6
        Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap()
    }

    #[test]
    fn rotation_bytes_are_stable() {
        for rotation in Rotation::ALL {
            assert_eq!(Rotation::from_u8(rotation.as_u8()), Some(rotation));
        }
        assert_eq!(Rotation::from_u8(4), None);
        assert_eq!(Rotation::Left.degrees(), 270);
    }

    #[test]
    fn right_turns_clockwise() {
        let rotated = sample().rotated(Rotation::Right);
        assert_eq!(
            rotated.to_rows(),
            vec![vec![4, 1], vec![5, 2], vec![6, 3]]
        );
    }

    #[test]
    fn down_flips_both_axes() {
        let rotated = sample().rotated(Rotation::Down);
        assert_eq!(rotated.to_rows(), vec![vec![6, 5, 4], vec![3, 2, 1]]);
    }

    #[test]
    fn left_turns_counter_clockwise() {
        let rotated = sample().rotated(Rotation::Left);
        assert_eq!(
            rotated.to_rows(),
            vec![vec![3, 6], vec![2, 5], vec![1, 4]]
        );
    }

    #[test]
    fn up_is_a_copy() {
        assert_eq!(sample().rotated(Rotation::Up), sample());
    }

    #[test]
    fn right_matches_documented_mapping() {
        // 2 wide x 1 tall with the right-hand cell set.
        let shape = Grid::from_rows(vec![vec![false, true]]).unwrap();
        let rotated = shape.rotated(Rotation::Right);
        assert_eq!((rotated.width(), rotated.height()), (1, 2));
        // src[1, 0] -> dst[h-1-0, 1] = dst[0, 1]
        assert!(rotated[(0, 1)]);
        assert!(!rotated[(0, 0)]);
    }

    #[test]
    fn four_quarter_turns_round_trip() {
        let original = sample();
        let mut grid = original.clone();
        for _ in 0..4 {
            grid = grid.rotated(Rotation::Right);
        }
        assert_eq!(grid, original);
    }

    #[test]
    fn rotated_size_swaps_on_quarter_turns() {
        assert_eq!(rotated_size(3, 2, Rotation::Up), (3, 2));
        assert_eq!(rotated_size(3, 2, Rotation::Right), (2, 3));
        assert_eq!(rotated_size(3, 2, Rotation::Down), (3, 2));
        assert_eq!(rotated_size(3, 2, Rotation::Left), (2, 3));
        for rotation in Rotation::ALL {
            let rotated = sample().rotated(rotation);
            assert_eq!(
                (rotated.width(), rotated.height()),
                rotated_size(3, 2, rotation)
            );
        }
    }

    #[test]
    fn empty_grid_rotates_to_empty() {
        let grid: Grid<bool> = Grid::new(0, 3).unwrap();
        let rotated = grid.rotated(Rotation::Right);
        assert_eq!((rotated.width(), rotated.height()), (3, 0));
    }
}
