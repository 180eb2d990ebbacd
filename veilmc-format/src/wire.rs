//! Server/client sync messages.
//!
//! A frame is one tag byte followed by the payload:
//! - `0x00` legacy single block-entity update (see [`crate::legacy`])
//! - `0x01` full store snapshot (uncompressed tag bytes, see [`crate::persist`])
//! - `0x02` single entry update (tag compound)
//!
//! Messages carry no sequence numbers. Applying them is idempotent.

use std::collections::HashMap;

use fastnbt::Value;
use veilmc_world::{BlockName, BlockState, Coordinate, PartitionId};

use crate::error::{CodecError, Result};
use crate::legacy::LegacyCamoUpdate;

pub const TAG_LEGACY: u8 = 0x00;
pub const TAG_FULL_SYNC: u8 = 0x01;
pub const TAG_ENTRY_UPDATE: u8 = 0x02;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    /// Replace the receiver's whole replica with this snapshot.
    FullSync { snapshot: Vec<u8> },
    /// Create, overwrite or remove a single entry.
    EntryUpdate(EntryUpdate),
    /// Update one block entity's camouflage. Never touches the store.
    LegacyCamo(LegacyCamoUpdate),
}

/// A single store mutation.
///
/// `apply == true` means create/overwrite and requires `displayed`;
/// `apply == false` means remove and carries no states. A receiver fills a
/// missing `underlying` from its own world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryUpdate {
    pub partition: PartitionId,
    pub coord: Coordinate,
    pub displayed: Option<BlockState>,
    pub underlying: Option<BlockState>,
    pub apply: bool,
}

impl EntryUpdate {
    pub fn apply(partition: PartitionId, coord: Coordinate, displayed: BlockState, underlying: BlockState) -> Self {
        Self {
            partition,
            coord,
            displayed: Some(displayed),
            underlying: Some(underlying),
            apply: true,
        }
    }

    pub fn remove(partition: PartitionId, coord: Coordinate) -> Self {
        Self {
            partition,
            coord,
            displayed: None,
            underlying: None,
            apply: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match (self.apply, &self.displayed, &self.underlying) {
            (true, None, _) => Err(CodecError::InvalidMessage(format!(
                "apply update at {} has no displayed state",
                self.coord
            ))),
            (false, Some(_), _) | (false, _, Some(_)) => Err(CodecError::InvalidMessage(format!(
                "remove update at {} carries block states",
                self.coord
            ))),
            _ => Ok(()),
        }
    }

    fn to_tag(&self) -> Value {
        let mut tag = HashMap::from([
            ("dimension".to_string(), Value::Int(self.partition)),
            ("x".to_string(), Value::Int(self.coord.x)),
            ("y".to_string(), Value::Int(self.coord.y)),
            ("z".to_string(), Value::Int(self.coord.z)),
            ("apply".to_string(), Value::Byte(self.apply as i8)),
        ]);
        if let Some(state) = &self.displayed {
            tag.insert("displayed".to_string(), state_tag(state));
        }
        if let Some(state) = &self.underlying {
            tag.insert("underlying".to_string(), state_tag(state));
        }
        Value::Compound(tag)
    }

    fn from_tag(tag: &Value) -> Result<Self> {
        let Value::Compound(tag) = tag else {
            return Err(CodecError::InvalidMessage("entry update is not a compound".to_string()));
        };
        let int = |key: &str| match tag.get(key) {
            Some(Value::Int(v)) => Ok(*v),
            _ => Err(CodecError::InvalidMessage(format!("entry update missing {key}"))),
        };
        let apply = match tag.get("apply") {
            Some(Value::Byte(v)) => *v != 0,
            _ => return Err(CodecError::InvalidMessage("entry update missing apply".to_string())),
        };

        let update = Self {
            partition: int("dimension")?,
            coord: Coordinate::new(int("x")?, int("y")?, int("z")?),
            displayed: tag.get("displayed").map(state_from_tag).transpose()?,
            underlying: tag.get("underlying").map(state_from_tag).transpose()?,
            apply,
        };
        update.validate()?;
        Ok(update)
    }
}

fn state_tag(state: &BlockState) -> Value {
    Value::Compound(HashMap::from([
        ("block".to_string(), Value::String(state.name.to_string())),
        ("meta".to_string(), Value::Int(state.variant as i32)),
    ]))
}

fn state_from_tag(tag: &Value) -> Result<BlockState> {
    let invalid = || CodecError::InvalidMessage("malformed block state".to_string());
    let Value::Compound(tag) = tag else {
        return Err(invalid());
    };
    let name = match tag.get("block") {
        Some(Value::String(raw)) => BlockName::parse(raw).ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    let variant = match tag.get("meta") {
        Some(Value::Int(meta)) => u8::try_from(*meta).map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };
    if variant >= veilmc_world::block::MAX_VARIANTS {
        return Err(invalid());
    }
    Ok(BlockState::new(name, variant))
}

impl SyncMessage {
    pub fn tag(&self) -> u8 {
        match self {
            SyncMessage::LegacyCamo(_) => TAG_LEGACY,
            SyncMessage::FullSync { .. } => TAG_FULL_SYNC,
            SyncMessage::EntryUpdate(_) => TAG_ENTRY_UPDATE,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = vec![self.tag()];
        match self {
            SyncMessage::FullSync { snapshot } => out.extend_from_slice(snapshot),
            SyncMessage::EntryUpdate(update) => {
                update.validate()?;
                out.extend(fastnbt::to_bytes(&update.to_tag()).map_err(CodecError::Nbt)?);
            }
            SyncMessage::LegacyCamo(update) => update.write_to(&mut out)?,
        }
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (&tag, payload) = bytes.split_first().ok_or(CodecError::Truncated("message tag"))?;
        match tag {
            TAG_FULL_SYNC => Ok(SyncMessage::FullSync {
                snapshot: payload.to_vec(),
            }),
            TAG_ENTRY_UPDATE => {
                let value: Value = fastnbt::from_bytes(payload).map_err(CodecError::Nbt)?;
                Ok(SyncMessage::EntryUpdate(EntryUpdate::from_tag(&value)?))
            }
            TAG_LEGACY => {
                let (update, used) = LegacyCamoUpdate::read_from(payload)?;
                if used != payload.len() {
                    log::debug!("Ignoring {} trailing bytes after legacy update", payload.len() - used);
                }
                Ok(SyncMessage::LegacyCamo(update))
            }
            other => Err(CodecError::UnknownTag(other)),
        }
    }
}
