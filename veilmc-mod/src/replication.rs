//! Applying sync messages to a replica, and building the frames the
//! authoritative side sends.

use veilmc_format::error::{CodecError, Result};
use veilmc_format::{DecodeReport, EntryUpdate, SyncMessage, persist};
use veilmc_world::{BlockLookup, BlockState, Location, SpatialStateStore, WorldAccess};

/// What a received message did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The whole replica was replaced from a snapshot.
    Replaced(DecodeReport),
    /// One entry was written.
    Put(Location),
    /// One entry was removed (or was already absent).
    Removed(Location),
    /// A block entity camouflage update; `accepted` is false when no
    /// suitable entity was found or the update had no descriptor.
    EntityCamo { accepted: bool },
}

/// Snapshot frame for a joining client.
pub fn full_sync_frame(store: &SpatialStateStore) -> Result<Vec<u8>> {
    SyncMessage::FullSync {
        snapshot: persist::encode(store)?,
    }
    .to_bytes()
}

pub fn entry_update_frame(update: EntryUpdate) -> Result<Vec<u8>> {
    SyncMessage::EntryUpdate(update).to_bytes()
}

/// Apply one decoded message to `store`.
///
/// Every variant is idempotent: applying the same message twice leaves the
/// same state as applying it once.
pub fn apply_message(
    message: SyncMessage,
    store: &mut SpatialStateStore,
    world: &mut dyn WorldAccess,
    blocks: &dyn BlockLookup,
) -> Result<Applied> {
    match message {
        SyncMessage::FullSync { snapshot } => {
            let decoded = persist::decode(&snapshot, blocks)?;
            if decoded.report.skipped > 0 {
                log::warn!(
                    "Full sync skipped {} entries, unknown blocks: {:?}",
                    decoded.report.skipped,
                    decoded.report.unknown_blocks
                );
            }
            *store = decoded.store;
            Ok(Applied::Replaced(decoded.report))
        }
        SyncMessage::EntryUpdate(update) => apply_entry_update(update, store, &*world, blocks),
        SyncMessage::LegacyCamo(update) => {
            let accepted = match &update.descriptor {
                Some(descriptor) => world.apply_entity_camo(update.coord, descriptor, update.sides),
                None => false,
            };
            if !accepted {
                log::debug!("No camouflage target at {}", update.coord);
            }
            Ok(Applied::EntityCamo { accepted })
        }
    }
}

fn apply_entry_update(
    update: EntryUpdate,
    store: &mut SpatialStateStore,
    world: &dyn WorldAccess,
    blocks: &dyn BlockLookup,
) -> Result<Applied> {
    update.validate()?;
    let location = Location::new(update.partition, update.coord);

    let Some(displayed) = update.displayed else {
        store.remove(update.partition, update.coord);
        return Ok(Applied::Removed(location));
    };

    let underlying = match update.underlying {
        Some(state) => state,
        // Only the world the client stands in can be queried.
        None if world.partition() == update.partition => world.block_at(update.coord),
        None => BlockState::stone(),
    };

    for state in [&displayed, &underlying] {
        if !blocks.knows(&state.name) {
            return Err(CodecError::InvalidMessage(format!(
                "entry update at {} names unknown block {}",
                update.coord, state.name
            )));
        }
    }

    store.put(update.partition, update.coord, displayed, underlying);
    Ok(Applied::Put(location))
}
