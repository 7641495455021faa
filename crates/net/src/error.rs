use stalway_core::ItemId;
use stalway_storage::StorageError;
use thiserror::Error;

/// Failures while decoding a snapshot or delta.
///
/// Decoding never panics on hostile input; every malformed record ends up
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Record ended mid-value.
    #[error("unexpected end of record")]
    UnexpectedEof,
    /// Varint longer than its target type.
    #[error("varint overflows {0}")]
    VarintOverflow(&'static str),
    /// A length exceeds the configured decode limits.
    #[error("{what} {value} exceeds limit {limit}")]
    LimitExceeded {
        /// Which length.
        what: &'static str,
        /// Decoded value.
        value: u64,
        /// Allowed maximum.
        limit: u64,
    },
    /// A `+1`-encoded field carried zero.
    #[error("{0} is missing")]
    MissingField(&'static str),
    /// Unknown operation tag.
    #[error("unknown operation tag {0}")]
    UnknownOperation(u8),
    /// Rotation byte outside 0..=3.
    #[error("invalid rotation byte {0}")]
    InvalidRotation(u8),
    /// Snapshot references an item the repository does not know.
    #[error("unknown item id {0}")]
    UnknownItem(ItemId),
    /// Bytes left after a complete record.
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
    /// Decoded snapshot breaks a storage invariant.
    #[error("snapshot rejected: {0}")]
    Storage(#[from] StorageError),
}

/// Failures reported by [`crate::SyncStorage`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Direct mutation on a replica.
    #[error("storage is a read-only replica")]
    ReadOnly,
    /// Item id missing from the repository.
    #[error("unknown item id {0}")]
    UnknownItem(ItemId),
    /// The underlying storage refused the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Malformed snapshot or delta.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// A replicated operation could not be applied locally.
    #[error("desync at operation {index} of delta")]
    Desync {
        /// Position of the failing operation in the delta.
        index: usize,
        /// Why it failed.
        #[source]
        source: Box<SyncError>,
    },
    /// A previous delta desynced; only a full snapshot is accepted.
    #[error("awaiting full snapshot after desync")]
    AwaitingResync,
}
