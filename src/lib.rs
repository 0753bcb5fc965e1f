//! Runtime gameplay state for game entities: granted abilities with
//! activation and cooldown, slot-limited stacked inventories, and
//! multi-objective quests. Definitions are authored in TOML and shared;
//! each owner keeps its own runtime instances.

pub mod ability;
pub mod config;
pub mod data;
pub mod error;
pub mod inventory;
pub mod listeners;
pub mod owner;
pub mod quest;
pub mod save;
pub mod session;
pub mod timer;

pub use ability::{AbilityDefinition, AbilityEvent, AbilityRegistry, AbilityState};
pub use config::GameplayConfig;
pub use data::DefinitionRepository;
pub use error::{ConfigError, DataError, SaveError};
pub use inventory::{InventoryEvent, InventoryLedger, ItemDefinition};
pub use listeners::{ListenerId, Listeners};
pub use owner::GameplayOwner;
pub use quest::{QuestDefinition, QuestEvent, QuestTracker};
pub use save::{FileSaveStore, MemorySaveStore, SaveData, SaveStore};
pub use timer::{Clock, ManualScheduler, Scheduler, TimerHandle};
