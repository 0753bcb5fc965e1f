//! Persistence
//!
//! Snapshots of each subsystem, the versioned save container, the stores that
//! hold encoded saves, and the auto-save schedule.

pub mod autosave;
pub mod snapshot;
pub mod store;

pub use autosave::{AutoSave, DEFAULT_AUTOSAVE_INTERVAL_MS, DEFAULT_AUTOSAVE_SLOT};
pub use snapshot::{
    AbilityRecord, AbilitySnapshot, ActiveQuestRecord, InventorySnapshot, ObjectiveRecord, QuestSnapshot,
    SaveData, StackRecord, SAVE_VERSION,
};
pub use store::{validate_slot, FileSaveStore, MemorySaveStore, SaveStore};
