//! Save stores: where versioned save blobs live, keyed by slot name

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::snapshot::SaveData;
use crate::error::SaveError;

const SLOT_EXTENSION: &str = "json";

/// Storage for opaque save blobs
pub trait SaveStore {
    fn write(&mut self, slot: &str, blob: &[u8]) -> Result<(), SaveError>;

    /// Fails with `SlotNotFound` for an empty slot
    fn read(&self, slot: &str) -> Result<Vec<u8>, SaveError>;

    fn exists(&self, slot: &str) -> bool;

    /// Returns true if the slot existed
    fn delete(&mut self, slot: &str) -> Result<bool, SaveError>;

    /// Occupied slot names in sorted order
    fn list(&self) -> Result<Vec<String>, SaveError>;

    /// Encode and write save data
    fn save(&mut self, slot: &str, data: &SaveData) -> Result<(), SaveError> {
        let blob = data.to_blob()?;
        match self.write(slot, &blob) {
            Ok(()) => {
                info!(target: "gameplay::save", "Save to slot '{}' succeeded (version {})", slot, data.version);
                Ok(())
            }
            Err(e) => {
                error!(target: "gameplay::save", "Save to slot '{}' failed: {}", slot, e);
                Err(e)
            }
        }
    }

    /// Read and decode save data
    fn load(&self, slot: &str) -> Result<SaveData, SaveError> {
        if !self.exists(slot) {
            warn!(target: "gameplay::save", "load: slot '{}' does not exist", slot);
            return Err(SaveError::SlotNotFound(slot.to_string()));
        }
        let data = SaveData::from_blob(&self.read(slot)?)?;
        info!(target: "gameplay::save", "Loaded slot '{}' (version {})", slot, data.version);
        Ok(data)
    }
}

/// Slot names become file names, so keep them to a safe character set
pub fn validate_slot(slot: &str) -> Result<(), SaveError> {
    let valid = !slot.is_empty()
        && slot.len() <= 64
        && slot.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
        && !slot.starts_with(' ')
        && !slot.ends_with(' ');
    if valid {
        Ok(())
    } else {
        Err(SaveError::InvalidSlot(slot.to_string()))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Keeps blobs in memory. Useful for tests and for quick-save within a session.
#[derive(Debug, Default, Clone)]
pub struct MemorySaveStore {
    slots: BTreeMap<String, Vec<u8>>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemorySaveStore {
    fn write(&mut self, slot: &str, blob: &[u8]) -> Result<(), SaveError> {
        validate_slot(slot)?;
        self.slots.insert(slot.to_string(), blob.to_vec());
        Ok(())
    }

    fn read(&self, slot: &str) -> Result<Vec<u8>, SaveError> {
        self.slots
            .get(slot)
            .cloned()
            .ok_or_else(|| SaveError::SlotNotFound(slot.to_string()))
    }

    fn exists(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    fn delete(&mut self, slot: &str) -> Result<bool, SaveError> {
        Ok(self.slots.remove(slot).is_some())
    }

    fn list(&self) -> Result<Vec<String>, SaveError> {
        Ok(self.slots.keys().cloned().collect())
    }
}

// ============================================================================
// Directory-backed store
// ============================================================================

/// One `<slot>.json` file per slot inside a directory
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    save_dir: PathBuf,
}

impl FileSaveStore {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_dir: save_dir.into(),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    /// Ensure save directory exists
    pub fn ensure_dir(&self) -> Result<(), SaveError> {
        fs::create_dir_all(&self.save_dir)?;
        Ok(())
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, SaveError> {
        validate_slot(slot)?;
        Ok(self.save_dir.join(format!("{}.{}", slot, SLOT_EXTENSION)))
    }
}

impl SaveStore for FileSaveStore {
    fn write(&mut self, slot: &str, blob: &[u8]) -> Result<(), SaveError> {
        let path = self.slot_path(slot)?;
        self.ensure_dir()?;

        // Replace atomically
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;

        debug!(target: "gameplay::save", "Wrote {} bytes to {:?}", blob.len(), path);
        Ok(())
    }

    fn read(&self, slot: &str) -> Result<Vec<u8>, SaveError> {
        let path = self.slot_path(slot)?;
        if !path.exists() {
            return Err(SaveError::SlotNotFound(slot.to_string()));
        }
        Ok(fs::read(&path)?)
    }

    fn exists(&self, slot: &str) -> bool {
        self.slot_path(slot).map(|path| path.exists()).unwrap_or(false)
    }

    fn delete(&mut self, slot: &str) -> Result<bool, SaveError> {
        let path = self.slot_path(slot)?;
        if !path.exists() {
            return Ok(false);
        }

        fs::remove_file(&path)?;
        info!(target: "gameplay::save", "Deleted save slot '{}'", slot);
        Ok(true)
    }

    fn list(&self) -> Result<Vec<String>, SaveError> {
        if !self.save_dir.exists() {
            return Ok(Vec::new());
        }

        let mut slots = Vec::new();
        for entry in fs::read_dir(&self.save_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == SLOT_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    slots.push(stem.to_string());
                }
            }
        }

        slots.sort();
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_slot() {
        assert!(validate_slot("AutoSave").is_ok());
        assert!(validate_slot("slot_1 - village").is_ok());
        assert!(validate_slot("").is_err());
        assert!(validate_slot("../escape").is_err());
        assert!(validate_slot("a/b").is_err());
        assert!(validate_slot(" padded").is_err());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemorySaveStore::new();
        assert!(matches!(store.load("missing"), Err(SaveError::SlotNotFound(_))));

        store.save("b", &SaveData::new("B")).unwrap();
        store.save("a", &SaveData::new("A")).unwrap();
        assert_eq!(store.list().unwrap(), vec!["a", "b"]);
        assert_eq!(store.load("a").unwrap().slot_display_name, "A");

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(!store.exists("a"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileSaveStore::new(tmp.path().join("saves"));
        assert!(store.list().unwrap().is_empty());

        let mut data = SaveData::new("Manual").with_level("cellar");
        data.set_int("gold", 12);
        store.save("slot1", &data).unwrap();

        assert!(store.exists("slot1"));
        assert!(tmp.path().join("saves").join("slot1.json").exists());
        assert_eq!(store.list().unwrap(), vec!["slot1"]);

        let loaded = store.load("slot1").unwrap();
        assert_eq!(loaded, data);

        assert!(store.delete("slot1").unwrap());
        assert!(matches!(store.load("slot1"), Err(SaveError::SlotNotFound(_))));
    }

    #[test]
    fn test_file_store_rejects_bad_slot() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileSaveStore::new(tmp.path());
        assert!(matches!(
            store.write("../../etc", b"{}"),
            Err(SaveError::InvalidSlot(_))
        ));
        assert!(!store.exists("../../etc"));
    }
}
