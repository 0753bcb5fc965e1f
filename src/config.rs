use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::save::DEFAULT_AUTOSAVE_SLOT;

/// Runtime settings read from `gameplay.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Root of the ability/item/quest definition files
    pub data_dir: PathBuf,
    pub save_dir: PathBuf,
    /// Inventory slot limit per owner (0 = unlimited)
    pub inventory_slots: usize,
    pub tick_ms: u64,
    pub autosave_interval_secs: u64,
    pub autosave_slot: String,
    /// Ticks the demo session runs for (0 = until interrupted)
    pub run_ticks: u64,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            save_dir: PathBuf::from("saves"),
            inventory_slots: 20,
            tick_ms: 50, // 20 Hz
            autosave_interval_secs: 300,
            autosave_slot: DEFAULT_AUTOSAVE_SLOT.to_string(),
            run_ticks: 600,
        }
    }
}

impl GameplayConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameplayConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    /// Auto-save interval, never shorter than one second
    pub fn autosave_interval_ms(&self) -> u64 {
        self.autosave_interval_secs.max(1).saturating_mul(1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = GameplayConfig::load(&tmp.path().join("gameplay.toml")).unwrap();
        assert_eq!(config, GameplayConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gameplay.toml");
        std::fs::write(&path, "inventory_slots = 8\nautosave_interval_secs = 0\n").unwrap();

        let config = GameplayConfig::load(&path).unwrap();
        assert_eq!(config.inventory_slots, 8);
        assert_eq!(config.autosave_interval_ms(), 1_000);
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gameplay.toml");
        std::fs::write(&path, "tick_ms = \"fast\"").unwrap();
        assert!(matches!(GameplayConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
