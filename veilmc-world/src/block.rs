//! Block identities and the block-kind registry.
//!
//! Blocks are identified by their namespaced string name (`minecraft:stone`),
//! which stays stable when numeric registry ids get shuffled between runs.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Namespace used when a name is given without one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Block variants are sub-state indices in `0..MAX_VARIANTS`.
pub const MAX_VARIANTS: u8 = 16;

/// A namespaced block identifier, e.g. `minecraft:stone`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockName {
    full: String,
    split: usize,
}

impl BlockName {
    /// Parse `namespace:path`. A bare `path` lands in the default namespace.
    /// Returns `None` for empty parts, extra colons or characters outside
    /// `[a-z0-9_.-/]`.
    pub fn parse(text: &str) -> Option<Self> {
        let (namespace, path) = match text.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (DEFAULT_NAMESPACE, text),
        };
        if namespace.is_empty() || path.is_empty() {
            return None;
        }
        let valid_ns = namespace
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-'));
        let valid_path = path
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-' | b'/'));
        if !valid_ns || !valid_path {
            return None;
        }
        Some(Self {
            full: format!("{namespace}:{path}"),
            split: namespace.len(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.full[..self.split]
    }

    pub fn path(&self) -> &str {
        &self.full[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for BlockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for BlockName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::parse(s) {
            Some(name) => Ok(name),
            None => bail!("malformed block name {s:?}"),
        }
    }
}

impl TryFrom<String> for BlockName {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<BlockName> for String {
    fn from(name: BlockName) -> Self {
        name.full
    }
}

/// A block type plus its variant index. Equality is by `(name, variant)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockState {
    pub name: BlockName,
    pub variant: u8,
}

impl BlockState {
    pub fn new(name: BlockName, variant: u8) -> Self {
        Self { name, variant }
    }

    /// Shorthand for tests and defaults. Falls back to air on a bad name.
    pub fn named(name: &str, variant: u8) -> Self {
        Self::new(BlockName::parse(name).unwrap_or_else(air_name), variant)
    }

    /// Sentinel returned when a coordinate has no disguise to display.
    pub fn air() -> Self {
        Self::new(air_name(), 0)
    }

    /// Fallback underlying state for coordinates without an entry.
    pub fn stone() -> Self {
        Self::new(stone_name(), 0)
    }

    pub fn is_air(&self) -> bool {
        self.name.as_str() == "minecraft:air"
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.variant)
    }
}

fn air_name() -> BlockName {
    BlockName {
        full: "minecraft:air".to_string(),
        split: 9,
    }
}

fn stone_name() -> BlockName {
    BlockName {
        full: "minecraft:stone".to_string(),
        split: 9,
    }
}

/// Optional capability a block kind can declare to opt itself in to
/// disguising, overriding the configured lists.
///
/// Every method answers "force allow?"; `false` means "no opinion".
pub trait EligibilityOverride: Send + Sync {
    fn can_be_mirrored(&self, _state: &BlockState) -> bool {
        false
    }

    fn can_host_disguise(&self, _state: &BlockState) -> bool {
        false
    }

    /// Opt-in for blocks that carry a block entity.
    fn block_entity_opt_in(&self, _state: &BlockState) -> bool {
        false
    }
}

/// Static description of a block type, built once when the host registers it.
#[derive(Clone)]
pub struct BlockKind {
    name: BlockName,
    block_entity: bool,
    disguise_block: bool,
    eligibility: Option<Arc<dyn EligibilityOverride>>,
}

impl BlockKind {
    pub fn new(name: BlockName) -> Self {
        Self {
            name,
            block_entity: false,
            disguise_block: false,
            eligibility: None,
        }
    }

    /// Marks the kind as owning custom internal state (a block entity).
    pub fn with_block_entity(mut self) -> Self {
        self.block_entity = true;
        self
    }

    /// Marks the kind as one of this mod's own disguise-producing blocks.
    pub fn disguise_block(mut self) -> Self {
        self.disguise_block = true;
        self
    }

    pub fn with_override(mut self, eligibility: Arc<dyn EligibilityOverride>) -> Self {
        self.eligibility = Some(eligibility);
        self
    }

    pub fn name(&self) -> &BlockName {
        &self.name
    }

    pub fn has_block_entity(&self) -> bool {
        self.block_entity
    }

    pub fn is_disguise_block(&self) -> bool {
        self.disguise_block
    }

    pub fn eligibility(&self) -> Option<&dyn EligibilityOverride> {
        self.eligibility.as_deref()
    }
}

impl fmt::Debug for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockKind")
            .field("name", &self.name)
            .field("block_entity", &self.block_entity)
            .field("disguise_block", &self.disguise_block)
            .field("has_override", &self.eligibility.is_some())
            .finish()
    }
}

/// Answers "does this identifier name a block that exists right now".
pub trait BlockLookup {
    fn knows(&self, name: &BlockName) -> bool;
}

/// Accepts every identifier. Used by offline tooling that has no registry.
pub struct AnyBlock;

impl BlockLookup for AnyBlock {
    fn knows(&self, _name: &BlockName) -> bool {
        true
    }
}

/// Block kinds known to the host, keyed by name.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    kinds: HashMap<BlockName, Arc<BlockKind>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: BlockKind) -> Result<Arc<BlockKind>> {
        if self.kinds.contains_key(kind.name()) {
            bail!("block {} registered twice", kind.name());
        }
        let kind = Arc::new(kind);
        self.kinds.insert(kind.name().clone(), kind.clone());
        Ok(kind)
    }

    pub fn get(&self, name: &BlockName) -> Option<&Arc<BlockKind>> {
        self.kinds.get(name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl BlockLookup for BlockRegistry {
    fn knows(&self, name: &BlockName) -> bool {
        self.kinds.contains_key(name)
    }
}
