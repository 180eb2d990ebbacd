//! Traits the host engine implements for the disguise logic to call into.

use crate::block::BlockState;
use crate::coords::{Coordinate, PartitionId};
use crate::item::{CaptureItem, CaptureStamp, HeldItem, SoundCue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    /// Modes in which items are consumed and rewards granted.
    pub fn consumes_items(self) -> bool {
        matches!(self, GameMode::Survival)
    }
}

/// Read-only view of one loaded world. The renderer only ever needs this.
pub trait WorldView {
    fn partition(&self) -> PartitionId;

    /// The block actually present at `coord` right now.
    fn block_at(&self, coord: Coordinate) -> BlockState;
}

/// Side effects the interaction and replication logic can trigger.
pub trait WorldAccess: WorldView {
    /// Display colour of `state` as it would appear at `coord`.
    fn map_color(&self, state: &BlockState, coord: Coordinate) -> u32;

    fn play_sound(&mut self, at: [f64; 3], cue: &SoundCue);

    /// Drop an item entity that only `owner` can pick up, with no delay.
    fn spawn_item(&mut self, at: [f64; 3], item: CaptureItem, owner: &str);

    /// Update the camouflage of a single block entity. Returns `false` when
    /// no suitable entity sits at `coord`.
    fn apply_entity_camo(&mut self, _coord: Coordinate, _descriptor: &fastnbt::Value, _sides: [bool; 6]) -> bool {
        false
    }
}

/// The acting player.
pub trait Player {
    fn id(&self) -> PlayerId;

    fn name(&self) -> &str;

    fn is_sneaking(&self) -> bool;

    fn game_mode(&self) -> GameMode;

    fn position(&self) -> [f64; 3];

    fn main_hand(&self) -> HeldItem;

    /// Record `stamp` on the capture item in the main hand.
    fn stamp_main_hand(&mut self, stamp: CaptureStamp);

    fn shrink_main_hand(&mut self, count: u32);

    /// Add one item to the inventory. `false` if there was no room.
    fn give(&mut self, item: CaptureItem) -> bool;

    fn swing_arm(&mut self);
}
