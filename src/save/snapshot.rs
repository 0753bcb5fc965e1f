//! Save data and per-subsystem snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ability::AbilityState;
use crate::error::SaveError;
use crate::quest::ObjectiveState;

/// Current save format version. Blobs with a higher version are refused.
pub const SAVE_VERSION: u32 = 1;

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityRecord {
    pub ability_id: String,
    pub state: AbilityState,
    /// Only meaningful when `state` is OnCooldown
    #[serde(default)]
    pub cooldown_remaining_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySnapshot {
    pub abilities: Vec<AbilityRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    pub item_id: String,
    pub quantity: i32,
}

/// Stacks in slot order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub stacks: Vec<StackRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveRecord {
    pub objective_id: String,
    pub current: i32,
    pub state: ObjectiveState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveQuestRecord {
    pub quest_id: String,
    pub objectives: Vec<ObjectiveRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestSnapshot {
    pub active: Vec<ActiveQuestRecord>,
    #[serde(default)]
    pub completed: Vec<String>,
    #[serde(default)]
    pub failed: Vec<String>,
}

// ============================================================================
// Save Data
// ============================================================================

/// Versioned container for everything persisted about one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    /// Wall-clock time the save was written
    pub saved_at: DateTime<Utc>,
    /// Friendly label shown in slot lists
    pub slot_display_name: String,
    /// Total play time in seconds
    pub play_time_secs: f64,
    pub level_name: String,
    /// Lightweight flags (tutorial shown, door opened, ...)
    #[serde(default)]
    pub bool_flags: BTreeMap<String, bool>,
    /// Lightweight counters (currency, kills, ...)
    #[serde(default)]
    pub int_values: BTreeMap<String, i32>,
    #[serde(default)]
    pub abilities: AbilitySnapshot,
    #[serde(default)]
    pub inventory: InventorySnapshot,
    #[serde(default)]
    pub quests: QuestSnapshot,
}

impl SaveData {
    pub fn new(slot_display_name: impl Into<String>) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Utc::now(),
            slot_display_name: slot_display_name.into(),
            play_time_secs: 0.0,
            level_name: String::new(),
            bool_flags: BTreeMap::new(),
            int_values: BTreeMap::new(),
            abilities: AbilitySnapshot::default(),
            inventory: InventorySnapshot::default(),
            quests: QuestSnapshot::default(),
        }
    }

    pub fn with_level(mut self, level_name: impl Into<String>) -> Self {
        self.level_name = level_name.into();
        self
    }

    pub fn with_play_time(mut self, secs: f64) -> Self {
        self.play_time_secs = secs;
        self
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.bool_flags.insert(key.into(), value);
    }

    pub fn flag(&self, key: &str) -> bool {
        self.bool_flags.get(key).copied().unwrap_or(false)
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i32) {
        self.int_values.insert(key.into(), value);
    }

    pub fn int(&self, key: &str) -> Option<i32> {
        self.int_values.get(key).copied()
    }

    /// Encode as a JSON blob
    pub fn to_blob(&self) -> Result<Vec<u8>, SaveError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode a JSON blob, refusing saves written by a newer format
    pub fn from_blob(blob: &[u8]) -> Result<Self, SaveError> {
        let data: SaveData = serde_json::from_slice(blob)?;
        if data.version > SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                found: data.version,
                supported: SAVE_VERSION,
            });
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_round_trip() {
        let mut data = SaveData::new("Slot 1").with_level("village").with_play_time(93.5);
        data.set_flag("tutorial_shown", true);
        data.set_int("gold", 250);
        data.inventory.stacks.push(StackRecord {
            item_id: "potion".into(),
            quantity: 3,
        });
        data.abilities.abilities.push(AbilityRecord {
            ability_id: "dash".into(),
            state: AbilityState::OnCooldown,
            cooldown_remaining_ms: 1200,
        });

        let decoded = SaveData::from_blob(&data.to_blob().unwrap()).unwrap();
        assert_eq!(decoded, data);
        assert!(decoded.flag("tutorial_shown"));
        assert!(!decoded.flag("missing"));
        assert_eq!(decoded.int("gold"), Some(250));
    }

    #[test]
    fn test_newer_version_is_refused() {
        let mut data = SaveData::new("future");
        data.version = SAVE_VERSION + 1;
        let blob = serde_json::to_vec(&data).unwrap();

        match SaveData::from_blob(&blob) {
            Err(SaveError::VersionMismatch { found, supported }) => {
                assert_eq!(found, SAVE_VERSION + 1);
                assert_eq!(supported, SAVE_VERSION);
            }
            other => panic!("expected version mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_blob_is_an_encoding_error() {
        assert!(matches!(SaveData::from_blob(b"not json"), Err(SaveError::Encoding(_))));
    }
}
