#![warn(missing_docs)]
//! Storage replication: operation log, compact wire records and the
//! [`SyncStorage`] wrapper shared by hosts and replicas.

mod codec;
mod error;
mod operation;
mod sync_storage;
pub mod wire;

pub use codec::{
    decode_delta, decode_snapshot, encode_delta, encode_snapshot, state_digest, DecodeLimits,
};
pub use error::{SyncError, WireError};
pub use operation::{Operation, OperationKind};
pub use sync_storage::{Authority, DeltaReport, Hook, SyncStorage};
