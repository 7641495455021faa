//! Snapshot and delta records.
//!
//! Snapshot: `[width+1][height+1][cells][slots+1][per slot][pending]`, where a
//! cell is `slot+1` or `0` when empty, and a slot is `item+1, x, y, rotation`
//! or `0` when vacant. Delta: `[count]` then `count` tagged operations.

use stalway_core::{Grid, ItemRepository, MAX_GRID_CELLS};
use stalway_storage::{SlotId, Storage, StorageError, StoredItem};

use crate::operation::{put_placement, read_placement};
use crate::wire::{Reader, Writer};
use crate::{Operation, WireError};

/// Upper bounds applied while decoding untrusted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum `width * height` of a snapshot.
    pub max_cells: usize,
    /// Maximum slot layout length of a snapshot.
    pub max_slots: usize,
    /// Maximum operations in one delta.
    pub max_operations: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_cells: MAX_GRID_CELLS,
            max_slots: 1 << 16,
            max_operations: 1 << 16,
        }
    }
}

fn check_limit(what: &'static str, value: usize, limit: usize) -> Result<(), WireError> {
    if value > limit {
        return Err(WireError::LimitExceeded {
            what,
            value: value as u64,
            limit: limit as u64,
        });
    }
    Ok(())
}

/// Read an optional `u32` stored as `value+1`, `0` meaning none.
fn optional_u32(input: &mut Reader<'_>) -> Result<Option<u32>, WireError> {
    match input.varint()?.checked_sub(1) {
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| WireError::VarintOverflow("u32")),
        None => Ok(None),
    }
}

/// Read a `value+1` field.
fn minus_one(input: &mut Reader<'_>, what: &'static str) -> Result<usize, WireError> {
    input
        .usize()?
        .checked_sub(1)
        .ok_or(WireError::MissingField(what))
}

/// Encode the full state of `storage` plus the sender's pending change count.
pub fn encode_snapshot(storage: &Storage, pending: u32) -> Vec<u8> {
    let mut out = Writer::new();
    out.put_usize(storage.width() + 1);
    out.put_usize(storage.height() + 1);
    for cell in storage.places().iter() {
        out.put_varint(cell.map_or(0, |slot| u64::from(slot.0) + 1));
    }

    let entries = storage.slots().entries();
    out.put_usize(entries.len() + 1);
    for entry in entries {
        match entry {
            Some(stored) => {
                out.put_varint(u64::from(stored.item().id) + 1);
                put_placement(&mut out, stored.position(), stored.rotation());
            }
            None => out.put_u8(0),
        }
    }
    out.put_varint(u64::from(pending));
    out.into_bytes()
}

/// Decode a snapshot, resolving items through `repository`.
///
/// Returns the rebuilt storage and the sender's pending change count.
pub fn decode_snapshot(
    bytes: &[u8],
    repository: &dyn ItemRepository,
    limits: &DecodeLimits,
) -> Result<(Storage, u32), WireError> {
    let mut input = Reader::new(bytes);

    let width = minus_one(&mut input, "width")?;
    let height = minus_one(&mut input, "height")?;
    let cells = width.checked_mul(height).ok_or(WireError::LimitExceeded {
        what: "cells",
        value: u64::MAX,
        limit: limits.max_cells as u64,
    })?;
    check_limit("cells", cells, limits.max_cells)?;

    let mut places = Vec::with_capacity(cells.min(input.remaining()));
    for _ in 0..cells {
        places.push(optional_u32(&mut input)?.map(SlotId));
    }
    let places = Grid::from_vec(places, width, height).map_err(StorageError::from)?;

    let slot_count = minus_one(&mut input, "slot count")?;
    check_limit("slots", slot_count, limits.max_slots)?;
    let mut entries = Vec::with_capacity(slot_count.min(input.remaining()));
    for _ in 0..slot_count {
        let entry = match optional_u32(&mut input)? {
            Some(id) => {
                let item = repository.item(id).ok_or(WireError::UnknownItem(id))?;
                let (position, rotation) = read_placement(&mut input)?;
                Some(StoredItem::new(item, position, rotation))
            }
            None => None,
        };
        entries.push(entry);
    }

    let pending = input.u32()?;
    input.finish()?;

    let storage = Storage::from_parts(places, entries)?;
    Ok((storage, pending))
}

/// Encode `operations` as a delta record.
pub fn encode_delta(operations: &[Operation]) -> Vec<u8> {
    let mut out = Writer::new();
    out.put_usize(operations.len());
    for op in operations {
        op.encode(&mut out);
    }
    out.into_bytes()
}

/// Decode a whole delta record. Nothing is applied here, so a truncated or
/// corrupt record is rejected as a unit.
pub fn decode_delta(bytes: &[u8], limits: &DecodeLimits) -> Result<Vec<Operation>, WireError> {
    let mut input = Reader::new(bytes);
    let count = input.usize()?;
    check_limit("operations", count, limits.max_operations)?;

    let mut operations = Vec::with_capacity(count.min(input.remaining()));
    for _ in 0..count {
        operations.push(Operation::decode(&mut input)?);
    }
    input.finish()?;
    Ok(operations)
}

/// Digest of the snapshot encoding, for comparing replicas.
///
/// The pending count is excluded so that peers with different unsent
/// buffers but identical contents agree.
pub fn state_digest(storage: &Storage) -> blake3::Hash {
    blake3::hash(&encode_snapshot(storage, 0))
}
