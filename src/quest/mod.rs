//! Quest System
//!
//! Multi-objective quests tracked per owner. Objective progress is routed to
//! the owning quest, which completes itself once its policy is satisfied.

pub mod definition;
pub mod events;
pub mod objective;
pub mod tracker;

pub use definition::{
    CompletionPolicy, NoopObjective, ObjectiveBehavior, ObjectiveDefinition, QuestDefinition, RawObjective,
    RawQuest, RawQuestFile,
};
pub use events::QuestEvent;
pub use objective::{ObjectiveInstance, ObjectiveState};
pub use tracker::{ActiveQuest, NoQuestHooks, QuestHooks, QuestTracker};
