//! Headless replication run.
//!
//! One owner mutates a storage at random; every round its delta is shipped to
//! the replicas, and every replica must end the round with the owner's digest.

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use stalway_core::{GridPos, ItemCatalog, ItemId, ItemRepository, Rotation};
use stalway_net::{state_digest, Authority, Operation, SyncError, SyncStorage};
use stalway_storage::SlotId;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::config::SimConfig;

/// Totals reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimSummary {
    /// Rounds completed.
    pub rounds: u64,
    /// Host operations that succeeded.
    pub operations: u64,
    /// Host operations refused by the storage.
    pub rejected: u64,
    /// Delta operations applied across all replicas.
    pub applied: u64,
    /// Operations the late replica skipped because its snapshot held them.
    pub skipped: u64,
    /// Items stored by the host at the end.
    pub final_items: usize,
    /// Hex digest of the host's final state.
    pub digest: String,
}

#[derive(Serialize)]
struct OpEvent<'a> {
    round: u64,
    op: &'a Operation,
}

/// Newline-delimited JSON log of the host's operations.
struct OpLog {
    out: BufWriter<File>,
}

impl OpLog {
    fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    fn write_round(&mut self, round: u64, ops: &[Operation]) -> Result<()> {
        for op in ops {
            serde_json::to_writer(&mut self.out, &OpEvent { round, op })?;
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }
}

struct Peer {
    name: &'static str,
    storage: SyncStorage,
}

pub fn run(cfg: &SimConfig, catalog: ItemCatalog) -> Result<SimSummary> {
    let ids: Vec<ItemId> = catalog.iter().map(|def| def.id).collect();
    if ids.is_empty() {
        bail!("item pack is empty");
    }
    let repository: Arc<dyn ItemRepository> = Arc::new(catalog);
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let mut host = SyncStorage::new(Arc::clone(&repository), Authority::Owner);
    host.resize(cfg.width, cfg.height)
        .context("Invalid storage dimensions")?;

    let mut peers = vec![Peer {
        name: "replica-a",
        storage: SyncStorage::new(Arc::clone(&repository), Authority::Replica),
    }];
    let mut summary = SimSummary::default();
    let mut log = cfg.event_log.as_deref().map(OpLog::create).transpose()?;

    for round in 1..=cfg.rounds {
        for _ in 0..cfg.ops_per_round {
            match random_operation(&mut rng, &mut host, &ids, cfg) {
                Ok(()) => summary.operations += 1,
                Err(err) => {
                    trace!(%err, "operation rejected");
                    summary.rejected += 1;
                }
            }
        }

        if round == cfg.late_join_round {
            let mut late = SyncStorage::new(Arc::clone(&repository), Authority::Replica);
            late.deserialize_all(&host.serialize_all())
                .context("Late replica rejected the host snapshot")?;
            info!(
                round,
                changes_ahead = late.changes_ahead(),
                "replica-b joined from snapshot"
            );
            peers.push(Peer {
                name: "replica-b",
                storage: late,
            });
        }

        if let Some(log) = log.as_mut() {
            log.write_round(round, host.pending_changes())?;
        }
        let delta = host.take_delta();
        for peer in &mut peers {
            let report = peer
                .storage
                .deserialize_delta(&delta)
                .with_context(|| format!("{} failed to apply round {round}", peer.name))?;
            peer.storage.clear_changes();
            summary.applied += report.applied as u64;
            summary.skipped += report.skipped as u64;
        }

        host.storage()
            .validate()
            .with_context(|| format!("Host storage inconsistent after round {round}"))?;
        let digest = state_digest(host.storage());
        for peer in &peers {
            if state_digest(peer.storage.storage()) != digest {
                bail!("{} diverged from host in round {round}", peer.name);
            }
        }
        debug!(
            round,
            items = host.storage().item_count(),
            bytes = delta.len(),
            digest = %digest.to_hex(),
            "round synced"
        );
        summary.rounds = round;
    }

    if let Some(log) = log.as_mut() {
        log.out.flush().context("Failed to flush event log")?;
    }
    summary.final_items = host.storage().item_count();
    summary.digest = state_digest(host.storage()).to_hex().to_string();
    Ok(summary)
}

fn random_rotation(rng: &mut StdRng) -> Rotation {
    Rotation::ALL[rng.gen_range(0..Rotation::ALL.len())]
}

fn random_position(rng: &mut StdRng, host: &SyncStorage) -> GridPos {
    let storage = host.storage();
    GridPos::new(
        rng.gen_range(0..storage.width().max(1)) as i32,
        rng.gen_range(0..storage.height().max(1)) as i32,
    )
}

fn random_slot(rng: &mut StdRng, host: &SyncStorage) -> SlotId {
    let slots: Vec<SlotId> = host.storage().items().map(|(slot, _)| slot).collect();
    match slots.choose(rng) {
        Some(&slot) => slot,
        // Nothing stored: probe a slot that cannot exist.
        None => SlotId(host.storage().slot_count() as u32),
    }
}

fn random_operation(
    rng: &mut StdRng,
    host: &mut SyncStorage,
    ids: &[ItemId],
    cfg: &SimConfig,
) -> Result<(), SyncError> {
    let item = ids[rng.gen_range(0..ids.len())];
    match rng.gen_range(0..100) {
        0..=34 => host.try_place_item(item).map(|_| ()),
        35..=54 => {
            let position = random_position(rng, host);
            let rotation = random_rotation(rng);
            host.place_item(item, position, rotation).map(|_| ())
        }
        55..=69 => {
            let slot = random_slot(rng, host);
            host.remove_item(slot).map(|_| ())
        }
        70..=93 => {
            let slot = random_slot(rng, host);
            let position = random_position(rng, host);
            let rotation = random_rotation(rng);
            host.replace_item(slot, position, rotation)
        }
        94..=97 => {
            let width = rng.gen_range(cfg.width.div_ceil(2).max(1)..=cfg.width + 2);
            let height = rng.gen_range(cfg.height.div_ceil(2).max(1)..=cfg.height + 2);
            host.resize(width, height)
        }
        _ => host.clear(),
    }
}
