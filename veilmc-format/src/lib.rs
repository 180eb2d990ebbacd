//! Byte formats for disguise data.
//!
//! - [`persist`]: the whole store as a named-binary-tag tree, optionally
//!   gzip-compressed for the on-disk world file.
//! - [`wire`]: messages exchanged between the server and its clients.
//! - [`legacy`]: the old single block-entity camouflage packet.

pub mod error;
pub mod legacy;
pub mod persist;
pub mod wire;

pub use error::CodecError;
pub use legacy::LegacyCamoUpdate;
pub use persist::{DecodeReport, Decoded};
pub use wire::{EntryUpdate, SyncMessage};
