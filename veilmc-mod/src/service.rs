use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use parking_lot::{Mutex, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use veilmc_format::{DecodeReport, EntryUpdate, SyncMessage, persist};
use veilmc_metrics::DisguiseMetrics;
use veilmc_storage::DisguiseArchive;
use veilmc_world::{
    BlockRegistry, BlockState, Coordinate, EligibilityPolicy, PendingToggles, Player, PlayerId, SpatialStateStore,
    WorldAccess, WorldView,
};

use crate::config::DisguiseConfig;
use crate::controller::{InteractionController, Outcome, Side};
use crate::replication::{self, Applied};
use crate::transport::Transport;

/// Owns one side's disguise state and wires it to the host.
///
/// The host calls the `on_*` handlers from its event bus. None of them
/// return errors: failures are logged, counted and degraded as the data
/// model allows.
pub struct DisguiseService {
    side: Side,
    config: DisguiseConfig,
    policy: EligibilityPolicy,
    store: RwLock<SpatialStateStore>,
    pending: Mutex<PendingToggles>,
    rng: Mutex<StdRng>,
    transport: Arc<dyn Transport>,
    archive: Option<Arc<dyn DisguiseArchive>>,
    metrics: Arc<DisguiseMetrics>,
}

impl DisguiseService {
    pub fn new(side: Side, config: DisguiseConfig, registry: Arc<BlockRegistry>, transport: Arc<dyn Transport>) -> Self {
        let policy = EligibilityPolicy::new(registry, &config.policy);
        Self {
            side,
            config,
            policy,
            store: RwLock::new(SpatialStateStore::new()),
            pending: Mutex::new(PendingToggles::new()),
            rng: Mutex::new(StdRng::from_entropy()),
            transport,
            archive: None,
            metrics: Arc::new(DisguiseMetrics::new()),
        }
    }

    pub fn with_archive(mut self, archive: Arc<dyn DisguiseArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Fixes the seed used for feedback pitches.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<DisguiseMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn config(&self) -> &DisguiseConfig {
        &self.config
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    pub fn metrics(&self) -> &Arc<DisguiseMetrics> {
        &self.metrics
    }

    /// A player used a block. Returns whether and how the click was claimed;
    /// anything but [`Outcome::Pass`] should cancel the host's default action.
    ///
    /// Host callbacks that mutate the world or the player run after the store
    /// lock is released, so they may query this service again.
    pub fn on_interact(&self, world: &mut dyn WorldAccess, player: &mut dyn Player, coord: Coordinate) -> Outcome {
        let mut interaction = {
            let mut store = self.store.write();
            let mut pending = self.pending.lock();
            let mut rng = self.rng.lock();
            InteractionController {
                side: self.side,
                store: &mut *store,
                pending: &mut *pending,
                policy: &self.policy,
                config: &self.config,
                rng: &mut *rng,
            }
            .handle(&*world, &*player, coord)
        };
        interaction.perform_effects(world, player);

        match &interaction.outcome {
            Outcome::Applied(entry) => {
                log::debug!("{} disguised {} as {}", player.name(), coord, entry.displayed);
                self.metrics.record_apply();
            }
            Outcome::Removed(entry) => {
                log::debug!("{} removed {} disguise at {}", player.name(), entry.displayed, coord);
                self.metrics.record_removal();
            }
            Outcome::Captured(_) => self.metrics.record_capture(),
            Outcome::Debounced => self.metrics.record_debounce(),
            Outcome::Pass | Outcome::Claimed => {}
        }

        if let Some(update) = interaction.broadcast {
            self.broadcast(update);
        }
        if interaction.notify_swing {
            if let Err(e) = self.transport.send_swing(player.id()) {
                log::warn!("Failed to send swing to {:?}: {:#}", player.id(), e);
            }
        }
        interaction.outcome
    }

    /// Send the whole store to a client that just joined.
    pub fn on_player_join(&self, player: PlayerId) {
        if self.side == Side::Replica {
            return;
        }
        let result = {
            let store = self.store.read();
            replication::full_sync_frame(&store)
        };
        let sent = result
            .context("Failed to encode full sync")
            .and_then(|frame| self.transport.send_to(player, &frame));
        match sent {
            Ok(()) => self.metrics.record_full_sync(),
            Err(e) => log::warn!("Full sync to {:?} not sent: {:#}", player, e),
        }
    }

    /// A sync frame arrived from the server. Returns what it changed, or
    /// `None` if the frame was rejected.
    pub fn on_message(&self, frame: &[u8], world: &mut dyn WorldAccess) -> Option<Applied> {
        match self.apply_frame(frame, world) {
            Ok(applied) => {
                self.metrics.record_message(true);
                Some(applied)
            }
            Err(e) => {
                log::warn!("Rejected sync message: {:#}", e);
                self.metrics.record_message(false);
                None
            }
        }
    }

    fn apply_frame(&self, frame: &[u8], world: &mut dyn WorldAccess) -> Result<Applied> {
        if self.side == Side::Authoritative {
            bail!("authoritative side does not accept sync messages");
        }
        let message = SyncMessage::from_bytes(frame).context("Failed to decode frame")?;
        let mut store = self.store.write();
        let applied = replication::apply_message(message, &mut store, world, &**self.policy.registry())?;
        if matches!(applied, Applied::Replaced(_)) {
            self.pending.lock().clear();
        }
        Ok(applied)
    }

    /// World save checkpoint. Does nothing on a replica.
    pub async fn on_world_save(&self) {
        if self.side == Side::Replica {
            return;
        }
        let Some(archive) = self.archive.clone() else {
            log::debug!("No archive configured, skipping save");
            return;
        };

        let start = Instant::now();
        match self.save_to(archive.as_ref()).await {
            Ok(entries) => {
                log::info!("Saved {} disguises in {:?}", entries, start.elapsed());
                self.metrics.record_save(start.elapsed(), entries);
            }
            Err(e) => {
                log::error!("Failed to save disguise data: {:#}", e);
                self.metrics.record_persistence_failure();
            }
        }
    }

    async fn save_to(&self, archive: &dyn DisguiseArchive) -> Result<usize> {
        // Encode under the read lock, write after releasing it.
        let (data, entries) = {
            let store = self.store.read();
            (persist::encode_compressed(&store)?, store.len())
        };
        archive.save(&data).await?;
        Ok(entries)
    }

    /// World load checkpoint. Replaces the store with what the archive
    /// holds. Absent or unreadable data leaves it empty.
    ///
    /// A replica keeps its contents: only the server's sync messages feed it.
    pub async fn on_world_load(&self) -> DecodeReport {
        if self.side == Side::Replica {
            return DecodeReport::default();
        }
        let Some(archive) = self.archive.clone() else {
            self.reset();
            return DecodeReport::default();
        };

        let start = Instant::now();
        let data = match archive.load().await {
            Ok(data) => data,
            Err(e) => {
                log::error!("Failed to read disguise data: {:#}", e);
                self.metrics.record_persistence_failure();
                self.reset();
                return DecodeReport::default();
            }
        };
        let Some(data) = data else {
            self.reset();
            return DecodeReport::default();
        };

        match persist::decode_compressed(&data, &**self.policy.registry()) {
            Ok(decoded) => {
                if decoded.report.skipped > 0 {
                    log::info!(
                        "Skipped {} disguise records, unknown blocks: {:?}",
                        decoded.report.skipped,
                        decoded.report.unknown_blocks
                    );
                }
                *self.store.write() = decoded.store;
                self.pending.lock().clear();
                self.metrics
                    .record_load(start.elapsed(), decoded.report.restored, decoded.report.skipped);
                decoded.report
            }
            Err(e) => {
                log::error!("Disguise data is corrupt, load aborted: {}", e);
                self.metrics.record_persistence_failure();
                self.reset();
                DecodeReport::default()
            }
        }
    }

    /// Clear every disguise and pending toggle in memory. The archive keeps
    /// its contents until the next save.
    pub fn reset(&self) {
        self.store.write().clear();
        self.pending.lock().clear();
    }

    /// Drop entries in `world`'s partition whose live block no longer
    /// matches what was recorded, or may no longer be disguised. Each
    /// removal is broadcast. Returns the number removed.
    pub fn prune_stale(&self, world: &dyn WorldView) -> usize {
        if self.side == Side::Replica {
            return 0;
        }
        let partition = world.partition();
        let removed: Vec<Coordinate> = {
            let mut store = self.store.write();
            let mut removed = Vec::new();
            for coord in store.coordinates(partition) {
                let live = world.block_at(coord);
                let stale = match store.entry(partition, coord) {
                    Some(entry) => live != entry.underlying || !self.policy.can_be_mirrored(&live),
                    None => {
                        log::error!("Entry at {} vanished during prune, aborting pass", coord);
                        break;
                    }
                };
                if stale {
                    store.remove(partition, coord);
                    removed.push(coord);
                }
            }
            removed
        };

        for &coord in &removed {
            self.broadcast(EntryUpdate::remove(partition, coord));
        }
        if !removed.is_empty() {
            log::info!("Pruned {} stale disguises in partition {}", removed.len(), partition);
            self.metrics.record_pruned(removed.len());
        }
        removed.len()
    }

    pub fn has_disguise<W: WorldView + ?Sized>(&self, world: &W, coord: Coordinate) -> bool {
        self.store.read().has(world, coord, &self.policy)
    }

    pub fn displayed_state<W: WorldView + ?Sized>(&self, world: &W, coord: Coordinate) -> BlockState {
        self.store.read().displayed(world, coord, &self.policy)
    }

    pub fn underlying_state<W: WorldView + ?Sized>(&self, world: &W, coord: Coordinate) -> BlockState {
        self.store.read().underlying(world, coord, &self.policy)
    }

    /// Copy of the current store.
    pub fn snapshot(&self) -> SpatialStateStore {
        self.store.read().clone()
    }

    fn broadcast(&self, update: EntryUpdate) {
        let sent = replication::entry_update_frame(update)
            .context("Failed to encode entry update")
            .and_then(|frame| self.transport.broadcast(&frame));
        if let Err(e) = &sent {
            log::warn!("Broadcast dropped: {:#}", e);
        }
        self.metrics.record_broadcast(sent.is_ok());
    }
}
