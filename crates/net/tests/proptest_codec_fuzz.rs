//! Fuzz-style property tests for the storage wire codec
//!
//! These tests validate that snapshot and delta decoders handle arbitrary
//! network input gracefully without crashing, and that well-formed records
//! survive a trip through the codec.

use std::sync::Arc;

use proptest::prelude::*;
use stalway_core::{GridPos, ItemRepository, Rotation};
use stalway_net::{
    decode_delta, decode_snapshot, encode_delta, encode_snapshot, state_digest, Authority,
    DecodeLimits, Operation, SyncStorage,
};
use stalway_storage::SlotId;
use stalway_testkit::{check_storage, sample_catalog};

fn rotation_strategy() -> impl Strategy<Value = Rotation> {
    prop_oneof![
        Just(Rotation::Up),
        Just(Rotation::Right),
        Just(Rotation::Down),
        Just(Rotation::Left),
    ]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (any::<u32>(), any::<i32>(), any::<i32>(), rotation_strategy()).prop_map(
            |(item, x, y, rotation)| Operation::Place {
                item,
                position: GridPos::new(x, y),
                rotation,
            }
        ),
        any::<u32>().prop_map(|slot| Operation::Remove { slot: SlotId(slot) }),
        (any::<u32>(), any::<i32>(), any::<i32>(), rotation_strategy()).prop_map(
            |(slot, x, y, rotation)| Operation::Replace {
                slot: SlotId(slot),
                position: GridPos::new(x, y),
                rotation,
            }
        ),
        (any::<usize>(), any::<usize>())
            .prop_map(|(width, height)| Operation::Resize { width, height }),
        Just(Operation::Clear),
    ]
}

proptest! {
    /// Property: Arbitrary bytes don't crash the delta decoder
    #[test]
    fn arbitrary_bytes_dont_crash_delta(
        random_bytes in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let _result = decode_delta(&random_bytes, &DecodeLimits::default());
        // No panic = success
    }

    /// Property: Arbitrary bytes don't crash the snapshot decoder, and
    /// whatever it accepts is a consistent storage
    #[test]
    fn arbitrary_bytes_dont_crash_snapshot(
        random_bytes in prop::collection::vec(any::<u8>(), 0..2000),
    ) {
        let catalog = sample_catalog().unwrap();
        if let Ok((storage, _)) = decode_snapshot(&random_bytes, &catalog, &DecodeLimits::default()) {
            prop_assert!(check_storage(&storage).is_ok());
        }
    }

    /// Property: Arbitrary bytes never partially apply to a replica
    #[test]
    fn rejected_delta_leaves_replica_untouched(
        random_bytes in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let catalog: Arc<dyn ItemRepository> = Arc::new(sample_catalog().unwrap());
        let mut host = SyncStorage::new(Arc::clone(&catalog), Authority::Owner);
        host.resize(5, 4).unwrap();
        host.try_place_item(2).unwrap();
        let mut replica = SyncStorage::new(catalog, Authority::Replica);
        replica.deserialize_all(&host.serialize_all()).unwrap();
        let before = state_digest(replica.storage());

        if replica.deserialize_delta(&random_bytes).is_err() && !replica.needs_resync() {
            prop_assert_eq!(state_digest(replica.storage()), before);
        }
    }

    /// Property: Well-formed deltas decode to the same operations
    #[test]
    fn delta_roundtrips(
        ops in prop::collection::vec(operation_strategy(), 0..40),
    ) {
        let bytes = encode_delta(&ops);
        let decoded = decode_delta(&bytes, &DecodeLimits::default()).unwrap();
        prop_assert_eq!(decoded, ops);
    }

    /// Property: Live storages survive a snapshot trip bit-for-bit
    #[test]
    fn snapshot_roundtrips(
        items in prop::collection::vec(1u32..=6, 0..20),
        removals in prop::collection::vec(0u32..20, 0..8),
        pending in any::<u32>(),
    ) {
        let catalog = sample_catalog().unwrap();
        let mut storage = stalway_storage::Storage::new(7, 6).unwrap();
        for id in items {
            let _ = storage.try_place_item(Arc::clone(catalog.get(id).unwrap()));
        }
        for slot in removals {
            let _ = storage.remove_item(SlotId(slot));
        }

        let bytes = encode_snapshot(&storage, pending);
        let (decoded, decoded_pending) =
            decode_snapshot(&bytes, &catalog, &DecodeLimits::default()).unwrap();
        prop_assert_eq!(decoded_pending, pending);
        prop_assert_eq!(encode_snapshot(&decoded, pending), bytes);
    }
}
