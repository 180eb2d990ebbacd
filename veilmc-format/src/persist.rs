//! Store <-> tag tree conversion.
//!
//! Layout of the root compound:
//!
//! ```text
//! worlds:
//!   dimension_<id>:
//!     blockpos: int[3n]                  x, y, z of every entry
//!     "<x> <y> <z>": { block, meta, replace_block, replace_meta }
//! info:
//!   dimensions: int[]                    every partition present
//! ```
//!
//! Blocks are stored by name. Decoding is lenient: a record that names an
//! unknown block, or is otherwise unreadable, is skipped and counted.

use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};

use fastnbt::{IntArray, Value};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use veilmc_world::block::MAX_VARIANTS;
use veilmc_world::{BlockLookup, BlockName, BlockState, Coordinate, PartitionId, SpatialStateStore};

use crate::error::{CodecError, Result};

const WORLDS: &str = "worlds";
const INFO: &str = "info";
const DIMENSIONS: &str = "dimensions";
const BLOCKPOS: &str = "blockpos";
const BLOCK: &str = "block";
const META: &str = "meta";
const REPLACE_BLOCK: &str = "replace_block";
const REPLACE_META: &str = "replace_meta";

/// Outcome of a lenient decode.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub restored: usize,
    pub skipped: usize,
    /// Identifiers that were not known to the registry.
    pub unknown_blocks: BTreeSet<String>,
}

#[derive(Debug)]
pub struct Decoded {
    pub store: SpatialStateStore,
    pub report: DecodeReport,
}

fn partition_key(partition: PartitionId) -> String {
    format!("dimension_{partition}")
}

/// Build the tag tree for `store`. The `blockpos` and `dimensions` arrays are
/// sorted; key order inside compounds is unspecified.
pub fn store_to_tag(store: &SpatialStateStore) -> Value {
    let partitions = store.partitions();
    let mut worlds = HashMap::new();

    for &partition in &partitions {
        let entries = store.entries(partition);
        let mut world = HashMap::with_capacity(entries.len() + 1);
        let mut positions = Vec::with_capacity(entries.len() * 3);

        for (coord, entry) in entries {
            positions.extend([coord.x, coord.y, coord.z]);
            let record = HashMap::from([
                (BLOCK.to_string(), Value::String(entry.displayed.name.to_string())),
                (META.to_string(), Value::Int(entry.displayed.variant as i32)),
                (REPLACE_BLOCK.to_string(), Value::String(entry.underlying.name.to_string())),
                (REPLACE_META.to_string(), Value::Int(entry.underlying.variant as i32)),
            ]);
            world.insert(coord.tag_key(), Value::Compound(record));
        }

        world.insert(BLOCKPOS.to_string(), Value::IntArray(IntArray::new(positions)));
        worlds.insert(partition_key(partition), Value::Compound(world));
    }

    let info = HashMap::from([(DIMENSIONS.to_string(), Value::IntArray(IntArray::new(partitions)))]);

    Value::Compound(HashMap::from([
        (WORLDS.to_string(), Value::Compound(worlds)),
        (INFO.to_string(), Value::Compound(info)),
    ]))
}

/// Rebuild a store from a tag tree. Only a tree whose root is not a compound
/// fails; everything below that degrades to skipped records.
pub fn store_from_tag(root: &Value, blocks: &dyn BlockLookup) -> Result<Decoded> {
    let Value::Compound(root) = root else {
        return Err(CodecError::Malformed("root tag is not a compound".to_string()));
    };

    let mut store = SpatialStateStore::new();
    let mut report = DecodeReport::default();

    let dimensions = compound(root.get(INFO))
        .and_then(|info| int_array(info.get(DIMENSIONS)))
        .unwrap_or_default();
    let worlds = compound(root.get(WORLDS));

    for partition in dimensions {
        let Some(world) = worlds.and_then(|w| compound(w.get(&partition_key(partition)))) else {
            log::warn!("Disguise data lists dimension {} but has no section for it", partition);
            continue;
        };
        let positions = int_array(world.get(BLOCKPOS)).unwrap_or_default();
        if positions.len() % 3 != 0 {
            log::warn!("Dimension {} has a truncated position list", partition);
            report.skipped += 1;
        }

        for triple in positions.chunks_exact(3) {
            let coord = Coordinate::new(triple[0], triple[1], triple[2]);
            match read_record(world.get(&coord.tag_key()), blocks, &mut report) {
                Some((displayed, underlying)) => {
                    store.put(partition, coord, displayed, underlying);
                    report.restored += 1;
                }
                None => {
                    log::warn!("Skipping disguise at {} in dimension {}", coord, partition);
                    report.skipped += 1;
                }
            }
        }
    }

    Ok(Decoded { store, report })
}

fn read_record(
    record: Option<&Value>,
    blocks: &dyn BlockLookup,
    report: &mut DecodeReport,
) -> Option<(BlockState, BlockState)> {
    let record = compound(record)?;
    let displayed = read_state(record, BLOCK, META, blocks, report)?;
    let underlying = read_state(record, REPLACE_BLOCK, REPLACE_META, blocks, report)?;
    Some((displayed, underlying))
}

fn read_state(
    record: &HashMap<String, Value>,
    name_key: &str,
    meta_key: &str,
    blocks: &dyn BlockLookup,
    report: &mut DecodeReport,
) -> Option<BlockState> {
    let Some(Value::String(raw)) = record.get(name_key) else {
        return None;
    };
    let Some(name) = BlockName::parse(raw).filter(|name| blocks.knows(name)) else {
        report.unknown_blocks.insert(raw.clone());
        return None;
    };
    let variant = u8::try_from(int_value(record.get(meta_key))?).ok()?;
    (variant < MAX_VARIANTS).then(|| BlockState::new(name, variant))
}

fn compound(value: Option<&Value>) -> Option<&HashMap<String, Value>> {
    match value {
        Some(Value::Compound(map)) => Some(map),
        _ => None,
    }
}

fn int_array(value: Option<&Value>) -> Option<Vec<i32>> {
    match value {
        Some(Value::IntArray(array)) => Some(array.iter().copied().collect()),
        _ => None,
    }
}

fn int_value(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Byte(v) => Some(*v as i32),
        Value::Short(v) => Some(*v as i32),
        Value::Int(v) => Some(*v),
        _ => None,
    }
}

/// Uncompressed tag bytes. Used for full-sync snapshots.
pub fn encode(store: &SpatialStateStore) -> Result<Vec<u8>> {
    fastnbt::to_bytes(&store_to_tag(store)).map_err(CodecError::Nbt)
}

pub fn decode(bytes: &[u8], blocks: &dyn BlockLookup) -> Result<Decoded> {
    let root: Value = fastnbt::from_bytes(bytes).map_err(CodecError::Nbt)?;
    store_from_tag(&root, blocks)
}

/// Gzip-compressed tag bytes, the on-disk world file format.
pub fn encode_compressed(store: &SpatialStateStore) -> Result<Vec<u8>> {
    let nbt_data = encode(store)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&nbt_data).map_err(CodecError::Compression)?;
    encoder.finish().map_err(CodecError::Compression)
}

pub fn decode_compressed(bytes: &[u8], blocks: &dyn BlockLookup) -> Result<Decoded> {
    let mut nbt_data = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut nbt_data)
        .map_err(CodecError::Compression)?;
    decode(&nbt_data, blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veilmc_world::{AnyBlock, BlockKind, BlockRegistry, EligibilityPolicy, PolicyLists, WorldView};

    struct Flat {
        partition: PartitionId,
        ground: BlockState,
    }

    impl WorldView for Flat {
        fn partition(&self) -> PartitionId {
            self.partition
        }

        fn block_at(&self, _coord: Coordinate) -> BlockState {
            self.ground.clone()
        }
    }

    fn policy() -> EligibilityPolicy {
        let mut registry = BlockRegistry::new();
        for name in ["minecraft:stone", "minecraft:dirt", "minecraft:planks"] {
            registry.register(BlockKind::new(BlockName::parse(name).unwrap())).unwrap();
        }
        EligibilityPolicy::new(Arc::new(registry), &PolicyLists::default())
    }

    struct Known(Vec<&'static str>);
    impl BlockLookup for Known {
        fn knows(&self, name: &BlockName) -> bool {
            self.0.contains(&name.as_str())
        }
    }

    fn known() -> Known {
        Known(vec!["minecraft:stone", "minecraft:dirt", "minecraft:planks"])
    }

    #[test]
    fn test_single_entry_round_trip() {
        let mut store = SpatialStateStore::new();
        let coord = Coordinate::new(-12, 70, 4093);
        let displayed = BlockState::named("minecraft:planks", 5);
        let underlying = BlockState::named("minecraft:dirt", 1);
        store.put(3, coord, displayed.clone(), underlying.clone());

        let bytes = encode(&store).unwrap();
        let decoded = decode(&bytes, &known()).unwrap();

        let entry = decoded.store.entry(3, coord).expect("entry restored");
        assert_eq!(entry.displayed, displayed);
        assert_eq!(entry.underlying, underlying);
        assert_eq!(decoded.report.restored, 1);
        assert_eq!(decoded.report.skipped, 0);

        let world = Flat {
            partition: 3,
            ground: underlying.clone(),
        };
        let policy = policy();
        assert!(decoded.store.has(&world, coord, &policy));
        assert_eq!(decoded.store.displayed(&world, coord, &policy), displayed);
    }

    #[test]
    fn test_empty_partition_not_restored() {
        let mut store = SpatialStateStore::new();
        store.put(0, Coordinate::new(0, 0, 0), BlockState::stone(), BlockState::stone());
        store.put(0, Coordinate::new(1, 0, 0), BlockState::stone(), BlockState::stone());
        store.put(1, Coordinate::new(9, 9, 9), BlockState::stone(), BlockState::stone());
        store.remove(1, Coordinate::new(9, 9, 9));
        assert_eq!(store.partitions(), vec![0, 1]);

        let decoded = decode(&encode(&store).unwrap(), &known()).unwrap();
        assert_eq!(decoded.store.partition_len(0), 2);
        assert_eq!(decoded.store.partition_len(1), 0);
        assert_eq!(decoded.store.len(), 2);
    }

    #[test]
    fn test_unknown_block_skipped() {
        let mut store = SpatialStateStore::new();
        store.put(0, Coordinate::new(0, 0, 0), BlockState::stone(), BlockState::stone());
        store.put(0, Coordinate::new(1, 0, 0), BlockState::named("modx:ghost", 0), BlockState::stone());
        store.put(0, Coordinate::new(2, 0, 0), BlockState::stone(), BlockState::named("minecraft:dirt", 0));

        let decoded = decode(&encode(&store).unwrap(), &known()).unwrap();
        assert_eq!(decoded.store.len(), 2);
        assert!(!decoded.store.contains(0, Coordinate::new(1, 0, 0)));
        assert_eq!(decoded.report.skipped, 1);
        assert!(decoded.report.unknown_blocks.contains("modx:ghost"));
    }

    #[test]
    fn test_missing_record_and_bad_meta_skipped() {
        let mut store = SpatialStateStore::new();
        store.put(0, Coordinate::new(0, 0, 0), BlockState::stone(), BlockState::stone());
        store.put(0, Coordinate::new(1, 0, 0), BlockState::stone(), BlockState::stone());
        store.put(0, Coordinate::new(2, 0, 0), BlockState::stone(), BlockState::stone());
        let mut tag = store_to_tag(&store);

        if let Value::Compound(root) = &mut tag {
            if let Some(Value::Compound(worlds)) = root.get_mut(WORLDS) {
                if let Some(Value::Compound(world)) = worlds.get_mut("dimension_0") {
                    world.remove("0 0 0");
                    if let Some(Value::Compound(record)) = world.get_mut("1 0 0") {
                        record.insert(META.to_string(), Value::Int(40));
                    }
                }
            }
        }

        let decoded = store_from_tag(&tag, &AnyBlock).unwrap();
        assert_eq!(decoded.store.len(), 1);
        assert_eq!(decoded.report.skipped, 2);
    }

    #[test]
    fn test_compressed_round_trip() {
        let mut store = SpatialStateStore::new();
        for i in 0..50 {
            store.put(i % 3, Coordinate::new(i, i * 2, -i), BlockState::stone(), BlockState::named("minecraft:dirt", 0));
        }
        let bytes = encode_compressed(&store).unwrap();
        // gzip magic
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let decoded = decode_compressed(&bytes, &known()).unwrap();
        assert_eq!(decoded.store, store);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode(&[0xde, 0xad, 0xbe, 0xef], &AnyBlock).is_err());
        assert!(decode_compressed(b"not gzip at all", &AnyBlock).is_err());
    }

    #[test]
    fn test_non_compound_root_is_malformed() {
        let err = store_from_tag(&Value::Int(3), &AnyBlock).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_empty_store_round_trip() {
        let decoded = decode(&encode(&SpatialStateStore::new()).unwrap(), &AnyBlock).unwrap();
        assert!(decoded.store.is_empty());
        assert_eq!(decoded.report, DecodeReport::default());
    }

    #[test]
    fn test_position_and_dimension_arrays_sorted() {
        let mut store = SpatialStateStore::new();
        for (partition, x, y, z) in [(1, 5, 0, 0), (-1, 0, 0, 0), (1, -3, 9, 9), (1, -3, 2, 7), (0, 1, 1, 1)] {
            store.put(partition, Coordinate::new(x, y, z), BlockState::stone(), BlockState::stone());
        }

        let Value::Compound(root) = store_to_tag(&store) else {
            panic!("root is not a compound");
        };
        let Some(Value::Compound(info)) = root.get(INFO) else {
            panic!("missing info");
        };
        let Some(Value::IntArray(dimensions)) = info.get(DIMENSIONS) else {
            panic!("missing dimensions");
        };
        assert_eq!(dimensions.iter().copied().collect::<Vec<_>>(), vec![-1, 0, 1]);

        let Some(Value::Compound(worlds)) = root.get(WORLDS) else {
            panic!("missing worlds");
        };
        let Some(Value::Compound(world)) = worlds.get("dimension_1") else {
            panic!("missing dimension_1");
        };
        let Some(Value::IntArray(positions)) = world.get(BLOCKPOS) else {
            panic!("missing blockpos");
        };
        assert_eq!(positions.iter().copied().collect::<Vec<_>>(), vec![-3, 2, 7, -3, 9, 9, 5, 0, 0]);
    }
}
