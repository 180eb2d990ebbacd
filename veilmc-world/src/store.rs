//! In-memory map of active disguises, partitioned by world.

use std::collections::HashMap;

use crate::block::BlockState;
use crate::coords::{Coordinate, PartitionId};
use crate::host::WorldView;
use crate::policy::EligibilityPolicy;

/// What a disguised coordinate shows, and what is really there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisguiseEntry {
    pub displayed: BlockState,
    pub underlying: BlockState,
}

impl DisguiseEntry {
    pub fn new(displayed: BlockState, underlying: BlockState) -> Self {
        Self { displayed, underlying }
    }
}

/// An entry exists for a coordinate iff that coordinate is disguised.
///
/// Partitions appear on first write and are never dropped, they may end up
/// empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialStateStore {
    partitions: HashMap<PartitionId, HashMap<Coordinate, DisguiseEntry>>,
}

impl SpatialStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite.
    pub fn put(&mut self, partition: PartitionId, coord: Coordinate, displayed: BlockState, underlying: BlockState) {
        self.partitions
            .entry(partition)
            .or_default()
            .insert(coord, DisguiseEntry::new(displayed, underlying));
    }

    /// Remove and return the entry, if any. Absent keys are not an error.
    pub fn remove(&mut self, partition: PartitionId, coord: Coordinate) -> Option<DisguiseEntry> {
        self.partitions.get_mut(&partition)?.remove(&coord)
    }

    pub fn entry(&self, partition: PartitionId, coord: Coordinate) -> Option<&DisguiseEntry> {
        self.partitions.get(&partition)?.get(&coord)
    }

    /// Raw presence, without re-checking the live world.
    pub fn contains(&self, partition: PartitionId, coord: Coordinate) -> bool {
        self.entry(partition, coord).is_some()
    }

    /// Is there a valid disguise at `coord` in `world`?
    ///
    /// Besides presence, the block currently in the world must still pass
    /// the mirror predicate; an out-of-band edit can invalidate a disguise.
    pub fn has<W: WorldView + ?Sized>(&self, world: &W, coord: Coordinate, policy: &EligibilityPolicy) -> bool {
        self.contains(world.partition(), coord) && policy.can_be_mirrored(&world.block_at(coord))
    }

    /// Displayed state, or air when [`has`](Self::has) is false.
    pub fn displayed<W: WorldView + ?Sized>(&self, world: &W, coord: Coordinate, policy: &EligibilityPolicy) -> BlockState {
        match self.entry(world.partition(), coord) {
            Some(entry) if self.has(world, coord, policy) => entry.displayed.clone(),
            _ => BlockState::air(),
        }
    }

    /// Underlying state, or stone when [`has`](Self::has) is false.
    pub fn underlying<W: WorldView + ?Sized>(&self, world: &W, coord: Coordinate, policy: &EligibilityPolicy) -> BlockState {
        match self.entry(world.partition(), coord) {
            Some(entry) if self.has(world, coord, policy) => entry.underlying.clone(),
            _ => BlockState::stone(),
        }
    }

    /// Partition ids in ascending order, empty partitions included.
    pub fn partitions(&self) -> Vec<PartitionId> {
        let mut ids: Vec<_> = self.partitions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Snapshot of the coordinates in a partition, sorted. Safe to iterate
    /// while removing from the store.
    pub fn coordinates(&self, partition: PartitionId) -> Vec<Coordinate> {
        let mut coords: Vec<_> = self
            .partitions
            .get(&partition)
            .map(|inner| inner.keys().copied().collect())
            .unwrap_or_default();
        coords.sort_unstable();
        coords
    }

    /// Entries of a partition sorted by coordinate.
    pub fn entries(&self, partition: PartitionId) -> Vec<(Coordinate, &DisguiseEntry)> {
        let mut entries: Vec<_> = self
            .partitions
            .get(&partition)
            .map(|inner| inner.iter().map(|(c, e)| (*c, e)).collect())
            .unwrap_or_default();
        entries.sort_unstable_by_key(|(coord, _)| *coord);
        entries
    }

    pub fn partition_len(&self, partition: PartitionId) -> usize {
        self.partitions.get(&partition).map_or(0, HashMap::len)
    }

    /// Total number of entries across all partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and every partition.
    pub fn clear(&mut self) {
        self.partitions.clear();
    }
}
