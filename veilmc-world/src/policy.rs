//! Which blocks may take part in a disguise.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wildmatch::WildMatch;

use crate::block::{BlockKind, BlockName, BlockRegistry, BlockState};

/// The configurable lists behind [`EligibilityPolicy`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyLists {
    /// Blocks that may not be used as a disguise source.
    pub mirror_blacklist: Vec<String>,
    /// Blocks that may not host a disguise.
    pub replacement_blacklist: Vec<String>,
    /// Block-entity blocks allowed as a source. `namespace:*` covers a namespace.
    pub block_entity_whitelist: Vec<String>,
}

/// Stateless predicates over block kinds. Never fails: unknown blocks and
/// malformed list entries simply don't match.
pub struct EligibilityPolicy {
    registry: Arc<BlockRegistry>,
    mirror_blacklist: HashSet<BlockName>,
    replacement_blacklist: HashSet<BlockName>,
    whitelist_exact: HashSet<BlockName>,
    whitelist_patterns: Vec<WildMatch>,
}

impl EligibilityPolicy {
    pub fn new(registry: Arc<BlockRegistry>, lists: &PolicyLists) -> Self {
        let mut whitelist_exact = HashSet::new();
        let mut whitelist_patterns = Vec::new();
        for entry in &lists.block_entity_whitelist {
            let entry = entry.trim();
            if entry.contains('*') {
                if entry.contains(':') {
                    whitelist_patterns.push(WildMatch::new(entry));
                } else {
                    log::warn!("Ignoring block entity whitelist pattern without namespace: {:?}", entry);
                }
            } else if let Some(name) = parse_entry("block_entity_whitelist", entry) {
                whitelist_exact.insert(name);
            }
        }

        Self {
            registry,
            mirror_blacklist: parse_list("mirror_blacklist", &lists.mirror_blacklist),
            replacement_blacklist: parse_list("replacement_blacklist", &lists.replacement_blacklist),
            whitelist_exact,
            whitelist_patterns,
        }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    /// May `state` be shown on top of another block?
    pub fn can_be_mirrored(&self, state: &BlockState) -> bool {
        let Some(kind) = self.registry.get(&state.name) else {
            return false;
        };
        if kind.is_disguise_block() {
            return false;
        }
        if kind.has_block_entity() {
            return self.block_entity_opt_in(kind, state);
        }
        let forced = kind.eligibility().is_some_and(|o| o.can_be_mirrored(state));
        forced || !self.mirror_blacklist.contains(&state.name)
    }

    /// May the block `state` be covered by a disguise?
    pub fn can_host_disguise(&self, state: &BlockState) -> bool {
        let Some(kind) = self.registry.get(&state.name) else {
            return false;
        };
        if kind.is_disguise_block() {
            return false;
        }
        let forced = kind.eligibility().is_some_and(|o| o.can_host_disguise(state));
        forced || !self.replacement_blacklist.contains(&state.name)
    }

    fn block_entity_opt_in(&self, kind: &BlockKind, state: &BlockState) -> bool {
        if kind.eligibility().is_some_and(|o| o.block_entity_opt_in(state)) {
            return true;
        }
        self.whitelist_exact.contains(kind.name())
            || self
                .whitelist_patterns
                .iter()
                .any(|pattern| pattern.matches(kind.name().as_str()))
    }
}

fn parse_list(list: &str, entries: &[String]) -> HashSet<BlockName> {
    entries
        .iter()
        .filter_map(|entry| parse_entry(list, entry.trim()))
        .collect()
}

fn parse_entry(list: &str, entry: &str) -> Option<BlockName> {
    let name = BlockName::parse(entry);
    if name.is_none() {
        log::warn!("Ignoring malformed {} entry: {:?}", list, entry);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::EligibilityOverride;

    struct AlwaysOptIn;
    impl EligibilityOverride for AlwaysOptIn {
        fn block_entity_opt_in(&self, _state: &BlockState) -> bool {
            true
        }
    }

    fn name(s: &str) -> BlockName {
        BlockName::parse(s).unwrap()
    }

    fn registry() -> Arc<BlockRegistry> {
        let mut registry = BlockRegistry::new();
        registry.register(BlockKind::new(name("minecraft:stone"))).unwrap();
        registry.register(BlockKind::new(name("minecraft:glass"))).unwrap();
        registry.register(BlockKind::new(name("minecraft:chest")).with_block_entity()).unwrap();
        registry.register(BlockKind::new(name("modx:machine")).with_block_entity()).unwrap();
        registry
            .register(
                BlockKind::new(name("mody:pipe"))
                    .with_block_entity()
                    .with_override(Arc::new(AlwaysOptIn)),
            )
            .unwrap();
        registry.register(BlockKind::new(name("veilmc:ghost_block")).disguise_block()).unwrap();
        Arc::new(registry)
    }

    fn lists() -> PolicyLists {
        PolicyLists {
            mirror_blacklist: vec!["minecraft:glass".into(), "not a name".into()],
            replacement_blacklist: vec!["minecraft:stone".into()],
            block_entity_whitelist: vec!["modx:*".into(), "*".into()],
        }
    }

    #[test]
    fn test_mirror_blacklist() {
        let policy = EligibilityPolicy::new(registry(), &lists());
        assert!(!policy.can_be_mirrored(&BlockState::named("minecraft:glass", 0)));
        assert!(policy.can_be_mirrored(&BlockState::named("minecraft:stone", 0)));
    }

    #[test]
    fn test_namespace_wildcard_whitelist() {
        let policy = EligibilityPolicy::new(registry(), &lists());
        assert!(policy.can_be_mirrored(&BlockState::named("modx:machine", 2)));
        assert!(!policy.can_be_mirrored(&BlockState::named("minecraft:chest", 0)));
    }

    #[test]
    fn test_exact_whitelist() {
        let mut lists = lists();
        lists.block_entity_whitelist = vec!["minecraft:chest".into()];
        let policy = EligibilityPolicy::new(registry(), &lists);
        assert!(policy.can_be_mirrored(&BlockState::named("minecraft:chest", 0)));
        assert!(!policy.can_be_mirrored(&BlockState::named("modx:machine", 0)));
    }

    #[test]
    fn test_override_opt_in() {
        let policy = EligibilityPolicy::new(registry(), &PolicyLists::default());
        assert!(policy.can_be_mirrored(&BlockState::named("mody:pipe", 0)));
    }

    #[test]
    fn test_own_blocks_never_participate() {
        let policy = EligibilityPolicy::new(registry(), &PolicyLists::default());
        let ghost = BlockState::named("veilmc:ghost_block", 0);
        assert!(!policy.can_be_mirrored(&ghost));
        assert!(!policy.can_host_disguise(&ghost));
    }

    #[test]
    fn test_replacement_blacklist() {
        let policy = EligibilityPolicy::new(registry(), &lists());
        assert!(!policy.can_host_disguise(&BlockState::named("minecraft:stone", 0)));
        assert!(policy.can_host_disguise(&BlockState::named("minecraft:glass", 0)));
    }

    #[test]
    fn test_unknown_block_is_ineligible() {
        let policy = EligibilityPolicy::new(registry(), &lists());
        let ghost = BlockState::named("modx:ghost", 0);
        assert!(!policy.can_be_mirrored(&ghost));
        assert!(!policy.can_host_disguise(&ghost));
    }
}
