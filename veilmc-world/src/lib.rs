//! Shared data model for block disguises.
//!
//! Everything here is pure data plus the traits the host engine implements.
//! No I/O and no networking happen in this crate.

pub mod block;
pub mod coords;
pub mod host;
pub mod item;
pub mod pending;
pub mod policy;
pub mod store;

pub use block::{AnyBlock, BlockKind, BlockLookup, BlockName, BlockRegistry, BlockState, EligibilityOverride};
pub use coords::{Coordinate, Location, PartitionId};
pub use host::{GameMode, Player, PlayerId, WorldAccess, WorldView};
pub use item::{CaptureItem, CaptureStamp, HeldItem, SoundCue};
pub use pending::{GesturePhase, PendingToggles};
pub use policy::{EligibilityPolicy, PolicyLists};
pub use store::{DisguiseEntry, SpatialStateStore};
