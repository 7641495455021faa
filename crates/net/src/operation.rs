//! Replicated storage operations.

use serde::{Deserialize, Serialize};
use stalway_core::{GridPos, ItemId, Rotation};
use stalway_storage::SlotId;

use crate::wire::{Reader, Writer};
use crate::WireError;

/// Wire tag of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperationKind {
    /// [`Operation::Place`].
    Place = 0,
    /// [`Operation::Remove`].
    Remove = 1,
    /// [`Operation::Replace`].
    Replace = 2,
    /// [`Operation::Resize`].
    Resize = 3,
    /// [`Operation::Clear`].
    Clear = 4,
}

impl OperationKind {
    /// Parse a wire tag.
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Place),
            1 => Some(Self::Remove),
            2 => Some(Self::Replace),
            3 => Some(Self::Resize),
            4 => Some(Self::Clear),
            _ => None,
        }
    }
}

/// A successful mutation, as logged by the owner and replayed by peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Item placed; the receiver allocates the same slot deterministically.
    Place {
        /// Placed item kind.
        item: ItemId,
        /// Anchor.
        position: GridPos,
        /// Orientation.
        rotation: Rotation,
    },
    /// Item removed.
    Remove {
        /// Removed slot.
        slot: SlotId,
    },
    /// Item moved and/or rotated.
    Replace {
        /// Moved slot.
        slot: SlotId,
        /// New anchor.
        position: GridPos,
        /// New orientation.
        rotation: Rotation,
    },
    /// Storage dimensions changed.
    Resize {
        /// New width.
        width: usize,
        /// New height.
        height: usize,
    },
    /// Every item removed.
    Clear,
}

impl Operation {
    /// Wire tag.
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Place { .. } => OperationKind::Place,
            Operation::Remove { .. } => OperationKind::Remove,
            Operation::Replace { .. } => OperationKind::Replace,
            Operation::Resize { .. } => OperationKind::Resize,
            Operation::Clear => OperationKind::Clear,
        }
    }

    pub(crate) fn encode(&self, out: &mut Writer) {
        out.put_u8(self.kind() as u8);
        match *self {
            Operation::Place {
                item,
                position,
                rotation,
            } => {
                out.put_varint(u64::from(item));
                put_placement(out, position, rotation);
            }
            Operation::Remove { slot } => out.put_varint(u64::from(slot.0)),
            Operation::Replace {
                slot,
                position,
                rotation,
            } => {
                out.put_varint(u64::from(slot.0));
                put_placement(out, position, rotation);
            }
            Operation::Resize { width, height } => {
                out.put_usize(width);
                out.put_usize(height);
            }
            Operation::Clear => {}
        }
    }

    pub(crate) fn decode(input: &mut Reader<'_>) -> Result<Self, WireError> {
        let tag = input.u8()?;
        let kind = OperationKind::from_u8(tag).ok_or(WireError::UnknownOperation(tag))?;
        Ok(match kind {
            OperationKind::Place => {
                let item = input.u32()?;
                let (position, rotation) = read_placement(input)?;
                Operation::Place {
                    item,
                    position,
                    rotation,
                }
            }
            OperationKind::Remove => Operation::Remove {
                slot: SlotId(input.u32()?),
            },
            OperationKind::Replace => {
                let slot = SlotId(input.u32()?);
                let (position, rotation) = read_placement(input)?;
                Operation::Replace {
                    slot,
                    position,
                    rotation,
                }
            }
            OperationKind::Resize => Operation::Resize {
                width: input.usize()?,
                height: input.usize()?,
            },
            OperationKind::Clear => Operation::Clear,
        })
    }
}

pub(crate) fn put_placement(out: &mut Writer, position: GridPos, rotation: Rotation) {
    out.put_zigzag(position.x);
    out.put_zigzag(position.y);
    out.put_u8(rotation.as_u8());
}

pub(crate) fn read_placement(input: &mut Reader<'_>) -> Result<(GridPos, Rotation), WireError> {
    let x = input.zigzag()?;
    let y = input.zigzag()?;
    let raw = input.u8()?;
    let rotation = Rotation::from_u8(raw).ok_or(WireError::InvalidRotation(raw))?;
    Ok((GridPos::new(x, y), rotation))
}
