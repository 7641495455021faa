//! Replicated storage: logs successful mutations and replays peer deltas.
//!
//! The owner mutates and ships `take_delta()` records; peers apply them with
//! `deserialize_delta`. A peer that joins mid-stream bootstraps from
//! `serialize_all`, whose trailing pending count tells it how many of the
//! next delta's operations are already folded into the snapshot.

use std::fmt;
use std::sync::Arc;

use stalway_core::{GridPos, ItemDefinition, ItemId, ItemRepository, Rotation};
use stalway_storage::{Placement, SlotId, Storage, StoredItem};
use tracing::{debug, trace, warn};

use crate::codec::{self, DecodeLimits};
use crate::{Operation, OperationKind, SyncError};

/// Who may mutate a [`SyncStorage`] directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// Authoritative copy; local mutations are allowed and logged.
    Owner,
    /// Mirror; only replicated deltas and snapshots change it.
    Replica,
}

/// Outcome of [`SyncStorage::deserialize_delta`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaReport {
    /// Operations applied locally.
    pub applied: usize,
    /// Operations skipped because the bootstrap snapshot already held them.
    pub skipped: usize,
}

/// Callback run after a mutation, with the storage already updated.
pub type Hook = Box<dyn FnMut(&Storage, &Operation) + Send>;

#[derive(Default)]
struct Hooks {
    place: Vec<Hook>,
    remove: Vec<Hook>,
    replace: Vec<Hook>,
    resize: Vec<Hook>,
    clear: Vec<Hook>,
    change: Vec<Hook>,
}

impl Hooks {
    fn fire(&mut self, storage: &Storage, op: &Operation) {
        let specific = match op.kind() {
            OperationKind::Place => &mut self.place,
            OperationKind::Remove => &mut self.remove,
            OperationKind::Replace => &mut self.replace,
            OperationKind::Resize => &mut self.resize,
            OperationKind::Clear => &mut self.clear,
        };
        for hook in specific.iter_mut().chain(self.change.iter_mut()) {
            hook(storage, op);
        }
    }
}

/// Storage wrapper that records every successful mutation for replication.
pub struct SyncStorage {
    storage: Storage,
    repository: Arc<dyn ItemRepository>,
    authority: Authority,
    limits: DecodeLimits,
    changes: Vec<Operation>,
    changes_ahead: u32,
    needs_resync: bool,
    hooks: Hooks,
}

impl fmt::Debug for SyncStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncStorage")
            .field("storage", &self.storage)
            .field("authority", &self.authority)
            .field("changes", &self.changes)
            .field("changes_ahead", &self.changes_ahead)
            .field("needs_resync", &self.needs_resync)
            .finish_non_exhaustive()
    }
}

impl SyncStorage {
    /// Empty 0x0 storage; the owner sizes it with [`SyncStorage::resize`].
    pub fn new(repository: Arc<dyn ItemRepository>, authority: Authority) -> Self {
        Self::with_storage(Storage::default(), repository, authority)
    }

    /// Wrap an existing storage. Its current contents are not logged.
    pub fn with_storage(
        storage: Storage,
        repository: Arc<dyn ItemRepository>,
        authority: Authority,
    ) -> Self {
        Self {
            storage,
            repository,
            authority,
            limits: DecodeLimits::default(),
            changes: Vec::new(),
            changes_ahead: 0,
            needs_resync: false,
            hooks: Hooks::default(),
        }
    }

    /// Override the decode limits applied to incoming records.
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Wrapped storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Mutation rights of this copy.
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Item repository used to resolve ids.
    pub fn repository(&self) -> &Arc<dyn ItemRepository> {
        &self.repository
    }

    /// Run `hook` after every place.
    pub fn on_place(&mut self, hook: impl FnMut(&Storage, &Operation) + Send + 'static) {
        self.hooks.place.push(Box::new(hook));
    }

    /// Run `hook` after every remove.
    pub fn on_remove(&mut self, hook: impl FnMut(&Storage, &Operation) + Send + 'static) {
        self.hooks.remove.push(Box::new(hook));
    }

    /// Run `hook` after every move/rotate.
    pub fn on_replace(&mut self, hook: impl FnMut(&Storage, &Operation) + Send + 'static) {
        self.hooks.replace.push(Box::new(hook));
    }

    /// Run `hook` after every resize.
    pub fn on_resize(&mut self, hook: impl FnMut(&Storage, &Operation) + Send + 'static) {
        self.hooks.resize.push(Box::new(hook));
    }

    /// Run `hook` after every clear.
    ///
    /// The items are already gone when it runs, so the hook sees an empty
    /// storage with the old dimensions.
    pub fn on_clear(&mut self, hook: impl FnMut(&Storage, &Operation) + Send + 'static) {
        self.hooks.clear.push(Box::new(hook));
    }

    /// Run `hook` after every mutation, following the kind-specific hooks.
    pub fn on_change(&mut self, hook: impl FnMut(&Storage, &Operation) + Send + 'static) {
        self.hooks.change.push(Box::new(hook));
    }

    fn ensure_owner(&self) -> Result<(), SyncError> {
        match self.authority {
            Authority::Owner => Ok(()),
            Authority::Replica => Err(SyncError::ReadOnly),
        }
    }

    fn resolve(&self, id: ItemId) -> Result<Arc<ItemDefinition>, SyncError> {
        self.repository.item(id).ok_or(SyncError::UnknownItem(id))
    }

    fn record(&mut self, op: Operation) {
        trace!(?op, "recorded change");
        self.hooks.fire(&self.storage, &op);
        self.changes.push(op);
    }

    /// Place item `id` at `position`.
    pub fn place_item(
        &mut self,
        id: ItemId,
        position: GridPos,
        rotation: Rotation,
    ) -> Result<SlotId, SyncError> {
        self.ensure_owner()?;
        let item = self.resolve(id)?;
        let slot = self.storage.place_item(item, position, rotation)?;
        self.record(Operation::Place {
            item: id,
            position,
            rotation,
        });
        Ok(slot)
    }

    /// Place item `id` wherever it fits; logged as an explicit placement.
    pub fn try_place_item(&mut self, id: ItemId) -> Result<Placement, SyncError> {
        self.ensure_owner()?;
        let item = self.resolve(id)?;
        let placement = self.storage.try_place_item(item)?;
        self.record(Operation::Place {
            item: id,
            position: placement.position,
            rotation: placement.rotation,
        });
        Ok(placement)
    }

    /// Remove the item in `slot`.
    pub fn remove_item(&mut self, slot: SlotId) -> Result<StoredItem, SyncError> {
        self.ensure_owner()?;
        let removed = self.storage.remove_item(slot)?;
        self.record(Operation::Remove { slot });
        Ok(removed)
    }

    /// Move and/or rotate the item in `slot`.
    pub fn replace_item(
        &mut self,
        slot: SlotId,
        position: GridPos,
        rotation: Rotation,
    ) -> Result<(), SyncError> {
        self.ensure_owner()?;
        self.storage.replace_item(slot, position, rotation)?;
        self.record(Operation::Replace {
            slot,
            position,
            rotation,
        });
        Ok(())
    }

    /// Change dimensions. Resizing to the current size is not logged.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<(), SyncError> {
        self.ensure_owner()?;
        self.resize_unchecked(width, height)
    }

    fn resize_unchecked(&mut self, width: usize, height: usize) -> Result<(), SyncError> {
        if (width, height) == (self.storage.width(), self.storage.height()) {
            return Ok(());
        }
        self.storage.resize(width, height)?;
        self.record(Operation::Resize { width, height });
        Ok(())
    }

    /// Remove every item. Clear hooks run afterwards.
    pub fn clear(&mut self) -> Result<(), SyncError> {
        self.ensure_owner()?;
        self.storage.clear();
        self.record(Operation::Clear);
        Ok(())
    }

    /// Changes not yet shipped, oldest first.
    pub fn pending_changes(&self) -> &[Operation] {
        &self.changes
    }

    /// True when there are changes to ship.
    pub fn is_dirty(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Forget shipped changes. Call once every peer got the delta.
    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    /// Drop changes, the skip counter, any desync and all items.
    pub fn reset(&mut self) {
        self.changes.clear();
        self.changes_ahead = 0;
        self.needs_resync = false;
        self.storage.clear();
    }

    /// Operations of upcoming deltas that the last snapshot already contained.
    pub fn changes_ahead(&self) -> u32 {
        self.changes_ahead
    }

    /// True after a desync until a full snapshot is applied.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Encode the full state plus the pending change count.
    pub fn serialize_all(&self) -> Vec<u8> {
        let pending = u32::try_from(self.changes.len()).unwrap_or(u32::MAX);
        codec::encode_snapshot(&self.storage, pending)
    }

    /// Replace local state with a snapshot.
    pub fn deserialize_all(&mut self, bytes: &[u8]) -> Result<(), SyncError> {
        let (storage, pending) =
            codec::decode_snapshot(bytes, self.repository.as_ref(), &self.limits)?;
        self.storage = storage;
        self.changes.clear();
        self.changes_ahead = pending;
        self.needs_resync = false;
        debug!(
            width = self.storage.width(),
            height = self.storage.height(),
            items = self.storage.item_count(),
            changes_ahead = pending,
            "applied snapshot"
        );
        Ok(())
    }

    /// Encode pending changes without clearing them.
    pub fn serialize_delta(&self) -> Vec<u8> {
        codec::encode_delta(&self.changes)
    }

    /// Encode pending changes and clear them.
    pub fn take_delta(&mut self) -> Vec<u8> {
        let bytes = self.serialize_delta();
        self.changes.clear();
        bytes
    }

    /// Apply a peer's delta.
    ///
    /// The record is decoded in full first; a malformed record changes
    /// nothing. Operations already covered by the bootstrap snapshot are
    /// skipped. Applied operations are logged so they can be relayed.
    pub fn deserialize_delta(&mut self, bytes: &[u8]) -> Result<DeltaReport, SyncError> {
        if self.needs_resync {
            return Err(SyncError::AwaitingResync);
        }
        let operations = codec::decode_delta(bytes, &self.limits)?;

        let mut report = DeltaReport::default();
        for (index, op) in operations.into_iter().enumerate() {
            if self.changes_ahead > 0 {
                self.changes_ahead -= 1;
                report.skipped += 1;
                continue;
            }
            if let Err(source) = self.apply(op) {
                warn!(index, error = %source, "delta does not apply; awaiting snapshot");
                self.needs_resync = true;
                return Err(SyncError::Desync {
                    index,
                    source: Box::new(source),
                });
            }
            report.applied += 1;
        }

        debug!(
            applied = report.applied,
            skipped = report.skipped,
            "applied delta"
        );
        Ok(report)
    }

    fn apply(&mut self, op: Operation) -> Result<(), SyncError> {
        match op {
            Operation::Place {
                item,
                position,
                rotation,
            } => {
                let definition = self.resolve(item)?;
                self.storage.place_item(definition, position, rotation)?;
            }
            Operation::Remove { slot } => {
                self.storage.remove_item(slot)?;
            }
            Operation::Replace {
                slot,
                position,
                rotation,
            } => self.storage.replace_item(slot, position, rotation)?,
            Operation::Resize { width, height } => return self.resize_unchecked(width, height),
            Operation::Clear => self.storage.clear(),
        }
        self.record(op);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stalway_core::shape::parse_rows;
    use stalway_core::{ItemCatalog, ItemDefinition};
    use std::sync::Mutex;

    fn repository() -> Arc<dyn ItemRepository> {
        Arc::new(
            ItemCatalog::from_definitions([
                ItemDefinition::new(1, "unit", parse_rows(&["#"]).unwrap()),
                ItemDefinition::new(2, "bar", parse_rows(&["##"]).unwrap()),
            ])
            .unwrap(),
        )
    }

    fn owner(width: usize, height: usize) -> SyncStorage {
        let mut storage = SyncStorage::new(repository(), Authority::Owner);
        storage.resize(width, height).unwrap();
        storage.clear_changes();
        storage
    }

    #[test]
    fn successful_mutations_are_logged_in_order() {
        let mut host = owner(3, 3);
        let slot = host.place_item(2, GridPos::new(0, 0), Rotation::Up).unwrap();
        host.replace_item(slot, GridPos::new(1, 0), Rotation::Right)
            .unwrap();
        host.remove_item(slot).unwrap();

        let kinds: Vec<_> = host.pending_changes().iter().map(Operation::kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::Place,
                OperationKind::Replace,
                OperationKind::Remove
            ]
        );
    }

    #[test]
    fn failed_mutations_are_not_logged() {
        let mut host = owner(2, 1);
        host.place_item(2, GridPos::ORIGIN, Rotation::Up).unwrap();
        host.clear_changes();

        assert!(host.place_item(1, GridPos::new(1, 0), Rotation::Up).is_err());
        assert!(host.remove_item(SlotId(7)).is_err());
        assert_eq!(
            host.place_item(99, GridPos::ORIGIN, Rotation::Up),
            Err(SyncError::UnknownItem(99))
        );
        assert!(host.resize(1, 1).is_err());
        host.resize(2, 1).unwrap();
        assert!(!host.is_dirty());
    }

    #[test]
    fn hooks_fire_after_mutation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut host = owner(2, 2);

        let place_log = Arc::clone(&seen);
        host.on_place(move |storage, _| {
            place_log
                .lock()
                .unwrap()
                .push(format!("place:{}", storage.item_count()));
        });
        let change_log = Arc::clone(&seen);
        host.on_change(move |_, op| {
            change_log
                .lock()
                .unwrap()
                .push(format!("change:{:?}", op.kind()));
        });

        host.place_item(1, GridPos::ORIGIN, Rotation::Up).unwrap();
        host.clear().unwrap();
        let _ = host.place_item(1, GridPos::new(5, 5), Rotation::Up);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["place:1", "change:Place", "change:Clear"]
        );
    }

    #[test]
    fn replica_is_read_only_but_accepts_deltas() {
        let mut host = owner(2, 2);
        let mut replica = SyncStorage::new(repository(), Authority::Replica);
        replica.deserialize_all(&host.serialize_all()).unwrap();

        assert_eq!(
            replica.place_item(1, GridPos::ORIGIN, Rotation::Up),
            Err(SyncError::ReadOnly)
        );
        assert_eq!(replica.clear(), Err(SyncError::ReadOnly));

        host.place_item(1, GridPos::ORIGIN, Rotation::Up).unwrap();
        let report = replica.deserialize_delta(&host.take_delta()).unwrap();
        assert_eq!(
            report,
            DeltaReport {
                applied: 1,
                skipped: 0
            }
        );
        assert_eq!(replica.storage().places(), host.storage().places());
        assert_eq!(replica.pending_changes().len(), 1);
    }

    #[test]
    fn snapshot_skip_counter_covers_pending_changes() {
        let mut host = owner(3, 1);
        host.place_item(1, GridPos::new(0, 0), Rotation::Up).unwrap();
        host.place_item(1, GridPos::new(1, 0), Rotation::Up).unwrap();

        let mut late = SyncStorage::new(repository(), Authority::Replica);
        late.deserialize_all(&host.serialize_all()).unwrap();
        assert_eq!(late.changes_ahead(), 2);

        host.place_item(1, GridPos::new(2, 0), Rotation::Up).unwrap();
        let report = late.deserialize_delta(&host.take_delta()).unwrap();
        assert_eq!(
            report,
            DeltaReport {
                applied: 1,
                skipped: 2
            }
        );
        assert_eq!(late.changes_ahead(), 0);
        assert_eq!(
            codec::state_digest(late.storage()),
            codec::state_digest(host.storage())
        );
    }

    #[test]
    fn desync_requires_snapshot() {
        let mut host = owner(2, 1);
        let mut replica = SyncStorage::new(repository(), Authority::Replica);
        replica.deserialize_all(&host.serialize_all()).unwrap();

        host.place_item(1, GridPos::ORIGIN, Rotation::Up).unwrap();
        host.clear_changes();
        host.remove_item(SlotId(0)).unwrap();

        let err = replica.deserialize_delta(&host.take_delta()).unwrap_err();
        assert!(matches!(err, SyncError::Desync { index: 0, .. }));
        assert!(replica.needs_resync());
        assert_eq!(
            replica.deserialize_delta(&codec::encode_delta(&[])),
            Err(SyncError::AwaitingResync)
        );

        replica.deserialize_all(&host.serialize_all()).unwrap();
        assert!(!replica.needs_resync());
    }

    #[test]
    fn degenerate_resize_from_peer_is_a_desync() {
        let mut replica = SyncStorage::new(repository(), Authority::Replica);
        let delta = codec::encode_delta(&[Operation::Resize {
            width: usize::MAX,
            height: 0,
        }]);

        let err = replica.deserialize_delta(&delta).unwrap_err();
        assert!(matches!(err, SyncError::Desync { index: 0, .. }));
        assert_eq!((replica.storage().width(), replica.storage().height()), (0, 0));

        // Still encodable after the rejected op.
        let mut fresh = SyncStorage::new(repository(), Authority::Replica);
        fresh.deserialize_all(&replica.serialize_all()).unwrap();
        assert_eq!(
            codec::state_digest(fresh.storage()),
            codec::state_digest(replica.storage())
        );
    }

    #[test]
    fn clear_hooks_see_the_emptied_storage() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let mut host = owner(2, 2);
        host.place_item(1, GridPos::ORIGIN, Rotation::Up).unwrap();

        let log = Arc::clone(&counts);
        host.on_clear(move |storage, _| log.lock().unwrap().push(storage.item_count()));
        host.clear().unwrap();

        assert_eq!(*counts.lock().unwrap(), vec![0]);
    }

    #[test]
    fn malformed_delta_changes_nothing() {
        let mut host = owner(2, 1);
        let mut replica = SyncStorage::new(repository(), Authority::Replica);
        replica.deserialize_all(&host.serialize_all()).unwrap();

        host.place_item(1, GridPos::ORIGIN, Rotation::Up).unwrap();
        host.place_item(1, GridPos::new(1, 0), Rotation::Up).unwrap();
        let bytes = host.take_delta();

        assert!(matches!(
            replica.deserialize_delta(&bytes[..bytes.len() - 1]),
            Err(SyncError::Wire(_))
        ));
        assert_eq!(replica.storage().item_count(), 0);
        assert!(!replica.needs_resync());
    }

    #[test]
    fn reset_drops_everything_but_dimensions() {
        let mut host = owner(2, 2);
        host.place_item(1, GridPos::ORIGIN, Rotation::Up).unwrap();
        host.reset();
        assert!(!host.is_dirty());
        assert_eq!(host.storage().item_count(), 0);
        assert_eq!(host.storage().area(), 4);
    }
}
