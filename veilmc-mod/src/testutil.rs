//! Host doubles shared by the unit tests of this crate.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use parking_lot::Mutex;
use veilmc_world::{
    BlockKind, BlockName, BlockRegistry, BlockState, CaptureItem, CaptureStamp, Coordinate, EligibilityPolicy,
    GameMode, HeldItem, PartitionId, Player, PlayerId, PolicyLists, SoundCue, WorldAccess, WorldView,
};

use crate::transport::Transport;

pub fn registry() -> Arc<BlockRegistry> {
    let mut registry = BlockRegistry::new();
    for name in ["minecraft:stone", "minecraft:dirt", "minecraft:planks", "minecraft:glass", "minecraft:air"] {
        registry.register(BlockKind::new(BlockName::parse(name).unwrap())).unwrap();
    }
    registry
        .register(BlockKind::new(BlockName::parse("minecraft:chest").unwrap()).with_block_entity())
        .unwrap();
    registry
        .register(BlockKind::new(BlockName::parse("veilmc:ghost_block").unwrap()).disguise_block())
        .unwrap();
    Arc::new(registry)
}

pub fn lists() -> PolicyLists {
    PolicyLists {
        mirror_blacklist: vec!["minecraft:air".into()],
        replacement_blacklist: vec!["minecraft:stone".into()],
        block_entity_whitelist: Vec::new(),
    }
}

pub fn policy() -> EligibilityPolicy {
    EligibilityPolicy::new(registry(), &lists())
}

pub struct MockWorld {
    pub partition: PartitionId,
    pub blocks: HashMap<Coordinate, BlockState>,
    pub sounds: Vec<(String, [f64; 3])>,
    pub spawned: Vec<([f64; 3], CaptureItem, String)>,
    pub camo_entities: HashMap<Coordinate, [bool; 6]>,
}

impl MockWorld {
    pub fn new(partition: PartitionId) -> Self {
        Self {
            partition,
            blocks: HashMap::new(),
            sounds: Vec::new(),
            spawned: Vec::new(),
            camo_entities: HashMap::new(),
        }
    }

    pub fn with_block(mut self, coord: Coordinate, state: BlockState) -> Self {
        self.blocks.insert(coord, state);
        self
    }

    /// Places a block entity that accepts camouflage updates.
    pub fn with_camo_entity(mut self, coord: Coordinate) -> Self {
        self.camo_entities.insert(coord, [false; 6]);
        self
    }
}

impl WorldView for MockWorld {
    fn partition(&self) -> PartitionId {
        self.partition
    }

    fn block_at(&self, coord: Coordinate) -> BlockState {
        self.blocks.get(&coord).cloned().unwrap_or_else(BlockState::air)
    }
}

impl WorldAccess for MockWorld {
    fn map_color(&self, state: &BlockState, _coord: Coordinate) -> u32 {
        0x100 * state.variant as u32 + state.name.as_str().len() as u32
    }

    fn play_sound(&mut self, at: [f64; 3], cue: &SoundCue) {
        self.sounds.push((cue.name.clone(), at));
    }

    fn spawn_item(&mut self, at: [f64; 3], item: CaptureItem, owner: &str) {
        self.spawned.push((at, item, owner.to_string()));
    }

    fn apply_entity_camo(&mut self, coord: Coordinate, _descriptor: &fastnbt::Value, sides: [bool; 6]) -> bool {
        match self.camo_entities.get_mut(&coord) {
            Some(current) => {
                *current = sides;
                true
            }
            None => false,
        }
    }
}

pub struct MockPlayer {
    pub id: PlayerId,
    pub name: String,
    pub sneaking: bool,
    pub mode: GameMode,
    pub hand: HeldItem,
    pub hand_count: u32,
    pub inventory: Vec<CaptureItem>,
    pub inventory_full: bool,
    pub swings: usize,
}

impl MockPlayer {
    fn holding(hand: HeldItem, count: u32) -> Self {
        Self {
            id: PlayerId(42),
            name: "Steve".to_string(),
            sneaking: false,
            mode: GameMode::Survival,
            hand,
            hand_count: count,
            inventory: Vec::new(),
            inventory_full: false,
            swings: 0,
        }
    }

    pub fn empty_handed() -> Self {
        Self::holding(HeldItem::Empty, 0)
    }

    pub fn holding_other() -> Self {
        Self::holding(HeldItem::Other, 1)
    }

    pub fn holding_blank() -> Self {
        Self::holding(HeldItem::Capture(CaptureItem::blank()), 1)
    }

    pub fn holding_stamp(state: &BlockState, count: u32) -> Self {
        let stamp = CaptureStamp::from_state(state, 0);
        Self::holding(HeldItem::Capture(CaptureItem::stamped(stamp)), count)
    }

    pub fn sneaking(mut self) -> Self {
        self.sneaking = true;
        self
    }

    pub fn in_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_full_inventory(mut self) -> Self {
        self.inventory_full = true;
        self
    }

    pub fn stamp(&self) -> Option<CaptureStamp> {
        match &self.hand {
            HeldItem::Capture(item) => item.stamp.clone(),
            _ => None,
        }
    }
}

impl Player for MockPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_sneaking(&self) -> bool {
        self.sneaking
    }

    fn game_mode(&self) -> GameMode {
        self.mode
    }

    fn position(&self) -> [f64; 3] {
        [0.5, 64.0, 0.5]
    }

    fn main_hand(&self) -> HeldItem {
        self.hand.clone()
    }

    fn stamp_main_hand(&mut self, stamp: CaptureStamp) {
        if let HeldItem::Capture(item) = &mut self.hand {
            item.stamp = Some(stamp);
        }
    }

    fn shrink_main_hand(&mut self, count: u32) {
        self.hand_count = self.hand_count.saturating_sub(count);
        if self.hand_count == 0 {
            self.hand = HeldItem::Empty;
        }
    }

    fn give(&mut self, item: CaptureItem) -> bool {
        if self.inventory_full {
            return false;
        }
        self.inventory.push(item);
        true
    }

    fn swing_arm(&mut self) {
        self.swings += 1;
    }
}

/// Records every frame instead of sending it.
#[derive(Default)]
pub struct RecordingTransport {
    pub broadcasts: Mutex<Vec<Vec<u8>>>,
    pub direct: Mutex<Vec<(PlayerId, Vec<u8>)>>,
    pub swings: Mutex<Vec<PlayerId>>,
    pub offline: bool,
}

impl RecordingTransport {
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }
}

impl Transport for RecordingTransport {
    fn broadcast(&self, frame: &[u8]) -> Result<()> {
        if self.offline {
            bail!("channel closed");
        }
        self.broadcasts.lock().push(frame.to_vec());
        Ok(())
    }

    fn send_to(&self, player: PlayerId, frame: &[u8]) -> Result<()> {
        if self.offline {
            bail!("channel closed");
        }
        self.direct.lock().push((player, frame.to_vec()));
        Ok(())
    }

    fn send_swing(&self, player: PlayerId) -> Result<()> {
        self.swings.lock().push(player);
        Ok(())
    }
}
