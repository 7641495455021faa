//! Independent occupancy oracle.
//!
//! Rebuilds the expected places grid from the stored items alone, using its
//! own copy of the rotation tables, and compares it with what the storage
//! reports. Shares no code path with `Storage::validate`.

use anyhow::{bail, Result};
use stalway_core::{Rotation, Shape};
use stalway_storage::{SlotId, Storage};

/// Fail if the storage's places grid is not exactly the union of its items.
pub fn check_storage(storage: &Storage) -> Result<()> {
    let (width, height) = (storage.width(), storage.height());
    let mut expected: Vec<Option<SlotId>> = vec![None; width * height];

    for (slot, stored) in storage.items() {
        for (dx, dy) in rotated_cells(&stored.item().shape, stored.rotation()) {
            let x = i64::from(stored.position().x) + dx as i64;
            let y = i64::from(stored.position().y) + dy as i64;
            if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                bail!("slot {slot} covers ({x}, {y}) outside {width}x{height}");
            }
            let index = y as usize * width + x as usize;
            if let Some(other) = expected[index] {
                bail!("slots {other} and {slot} both cover ({x}, {y})");
            }
            expected[index] = Some(slot);
        }
    }

    for (x, y, actual) in storage.places().cells() {
        let want = expected[y * width + x];
        if *actual != want {
            bail!(
                "cell ({x}, {y}) holds {actual:?}, items say {want:?}\n{}",
                render(storage)
            );
        }
    }
    Ok(())
}

/// Covered cells of `shape` after `rotation`, relative to the new anchor.
pub fn rotated_cells(shape: &Shape, rotation: Rotation) -> Vec<(usize, usize)> {
    let (w, h) = (shape.width(), shape.height());
    shape
        .cells()
        .filter(|(_, _, &covered)| covered)
        .map(|(x, y, _)| match rotation {
            Rotation::Up => (x, y),
            Rotation::Right => (h - 1 - y, x),
            Rotation::Down => (w - 1 - x, h - 1 - y),
            Rotation::Left => (y, w - 1 - x),
        })
        .collect()
}

/// Rows of the places grid, `.` for empty cells and the slot number otherwise.
pub fn render(storage: &Storage) -> String {
    let rows = storage.places().to_rows();
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Some(slot) => slot.0.to_string(),
                    None => ".".to_string(),
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
