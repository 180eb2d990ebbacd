use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use veilmc_world::{PolicyLists, SoundCue};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "VEILMC_CONFIG";

pub const DEFAULT_MOD_ID: &str = "veilmc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisguiseConfig {
    /// Black/whitelists driving the eligibility predicates.
    pub policy: PolicyLists,
    /// Played when a capture item is stamped.
    pub capture_sound: SoundCue,
    /// Played client-side when a disguise is applied.
    pub apply_sound: SoundCue,
    /// Prefix of the per-world data file.
    pub mod_id: String,
}

impl Default for DisguiseConfig {
    fn default() -> Self {
        Self {
            policy: PolicyLists::default(),
            capture_sound: SoundCue::new("minecraft:block.sand.place", 1.0, 1.0),
            apply_sound: SoundCue::new("minecraft:block.slime.break", 1.0, 1.0),
            mod_id: DEFAULT_MOD_ID.to_string(),
        }
    }
}

impl DisguiseConfig {
    /// Read a JSON config. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load from the file named by `VEILMC_CONFIG`, or fall back to defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        Self::load(Path::new(&path)).unwrap_or_else(|e| {
            log::warn!("Ignoring config from {}: {:#}", CONFIG_ENV, e);
            Self::default()
        })
    }
}
