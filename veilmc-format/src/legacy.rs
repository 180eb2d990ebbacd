//! The single block-entity camouflage packet.
//!
//! Stream layout, all integers big-endian:
//! `x:i32 y:i32 z:i32 has_descriptor:u8 [len:i32 descriptor:nbt] sides:u8*6`

use fastnbt::Value;
use veilmc_world::Coordinate;

use crate::error::{CodecError, Result};

/// Camouflage state of one block entity: which of its six faces are
/// disguised, and an opaque description of what they look like.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyCamoUpdate {
    pub coord: Coordinate,
    pub descriptor: Option<Value>,
    pub sides: [bool; 6],
}

impl LegacyCamoUpdate {
    pub fn new(coord: Coordinate, descriptor: Option<Value>, sides: [bool; 6]) -> Self {
        Self { coord, descriptor, sides }
    }

    pub fn has_descriptor(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.coord.x.to_be_bytes());
        out.extend_from_slice(&self.coord.y.to_be_bytes());
        out.extend_from_slice(&self.coord.z.to_be_bytes());
        out.push(self.has_descriptor() as u8);

        if let Some(descriptor) = &self.descriptor {
            let nbt_data = fastnbt::to_bytes(descriptor).map_err(CodecError::Nbt)?;
            let len = i32::try_from(nbt_data.len())
                .map_err(|_| CodecError::InvalidMessage("descriptor too large".to_string()))?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&nbt_data);
        }

        out.extend(self.sides.iter().map(|&side| side as u8));
        Ok(())
    }

    /// Parse one update from the front of `input`. Returns it together with
    /// the number of bytes consumed.
    pub fn read_from(input: &[u8]) -> Result<(Self, usize)> {
        let mut reader = Reader { input, pos: 0 };
        let x = reader.i32("x")?;
        let y = reader.i32("y")?;
        let z = reader.i32("z")?;
        let has_descriptor = reader.bool("has_descriptor")?;

        let descriptor = if has_descriptor {
            let len = usize::try_from(reader.i32("descriptor length")?)
                .map_err(|_| CodecError::InvalidMessage("negative descriptor length".to_string()))?;
            let bytes = reader.take(len, "descriptor")?;
            Some(fastnbt::from_bytes::<Value>(bytes).map_err(CodecError::Nbt)?)
        } else {
            None
        };

        let mut sides = [false; 6];
        for side in sides.iter_mut() {
            *side = reader.bool("sides")?;
        }

        Ok((Self::new(Coordinate::new(x, y, z), descriptor, sides), reader.pos))
    }
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::Truncated(field))?;
        let bytes = self.input.get(self.pos..end).ok_or(CodecError::Truncated(field))?;
        self.pos = end;
        Ok(bytes)
    }

    fn i32(&mut self, field: &'static str) -> Result<i32> {
        let bytes = self.take(4, field)?;
        Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn bool(&mut self, field: &'static str) -> Result<bool> {
        Ok(self.take(1, field)?[0] != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn descriptor() -> Value {
        Value::Compound(HashMap::from([
            ("blockId".to_string(), Value::String("minecraft:bookshelf".to_string())),
            ("metadata".to_string(), Value::Int(0)),
        ]))
    }

    #[test]
    fn test_round_trip_with_descriptor() {
        let update = LegacyCamoUpdate::new(
            Coordinate::new(-5, 12, 900),
            Some(descriptor()),
            [true, false, true, true, false, false],
        );
        let mut bytes = Vec::new();
        update.write_to(&mut bytes).unwrap();

        let (decoded, used) = LegacyCamoUpdate::read_from(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded, update);
        assert_eq!(decoded.sides, [true, false, true, true, false, false]);
    }

    #[test]
    fn test_round_trip_without_descriptor() {
        let update = LegacyCamoUpdate::new(Coordinate::new(1, 2, 3), None, [false; 6]);
        let mut bytes = Vec::new();
        update.write_to(&mut bytes).unwrap();
        // 3 ints + flag + 6 sides
        assert_eq!(bytes.len(), 12 + 1 + 6);

        let (decoded, _) = LegacyCamoUpdate::read_from(&bytes).unwrap();
        assert_eq!(decoded, update);
        assert!(!decoded.has_descriptor());
    }

    #[test]
    fn test_truncated_stream() {
        let update = LegacyCamoUpdate::new(Coordinate::new(1, 2, 3), Some(descriptor()), [true; 6]);
        let mut bytes = Vec::new();
        update.write_to(&mut bytes).unwrap();
        bytes.truncate(bytes.len() - 2);

        let err = LegacyCamoUpdate::read_from(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::Truncated("sides")));
    }
}
