//! Items and feedback cues the interaction logic hands to the host.

use serde::{Deserialize, Serialize};

use crate::block::{BlockName, BlockState};

/// Block identity recorded on a capture item.
///
/// Field names match the item tag layout: `hit_block`, `hit_meta`,
/// `hit_color`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStamp {
    #[serde(rename = "hit_block")]
    pub block: BlockName,
    #[serde(rename = "hit_meta")]
    pub meta: i32,
    #[serde(rename = "hit_color")]
    pub color: i32,
}

impl CaptureStamp {
    pub fn from_state(state: &BlockState, color: u32) -> Self {
        Self {
            block: state.name.clone(),
            meta: state.variant as i32,
            color: color as i32,
        }
    }

    /// The stamped block, or `None` if the recorded variant is out of range.
    pub fn state(&self) -> Option<BlockState> {
        let variant = u8::try_from(self.meta).ok()?;
        (variant < crate::block::MAX_VARIANTS).then(|| BlockState::new(self.block.clone(), variant))
    }
}

/// One unit of the disguise capture item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureItem {
    pub stamp: Option<CaptureStamp>,
}

impl CaptureItem {
    pub fn blank() -> Self {
        Self { stamp: None }
    }

    pub fn stamped(stamp: CaptureStamp) -> Self {
        Self { stamp: Some(stamp) }
    }
}

/// What the acting player holds in their main hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeldItem {
    Empty,
    Capture(CaptureItem),
    Other,
}

impl HeldItem {
    pub fn is_empty(&self) -> bool {
        matches!(self, HeldItem::Empty)
    }
}

/// A sound the host should play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub name: String,
    pub volume: f32,
    pub pitch: f32,
}

impl SoundCue {
    pub fn new(name: &str, volume: f32, pitch: f32) -> Self {
        Self {
            name: name.to_string(),
            volume,
            pitch,
        }
    }
}
