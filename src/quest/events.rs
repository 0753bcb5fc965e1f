//! Quest Event Types

use serde::Serialize;

/// Notifications broadcast by a [`super::QuestTracker`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum QuestEvent {
    QuestStarted {
        owner: String,
        quest_id: String,
    },
    /// Progress was applied to an objective
    ObjectiveProgress {
        owner: String,
        quest_id: String,
        objective_id: String,
        current: i32,
        required: i32,
    },
    ObjectiveCompleted {
        owner: String,
        quest_id: String,
        objective_id: String,
        /// Position of the objective within its quest
        index: usize,
    },
    QuestCompleted {
        owner: String,
        quest_id: String,
    },
    QuestFailed {
        owner: String,
        quest_id: String,
    },
}

impl QuestEvent {
    pub fn quest_id(&self) -> &str {
        match self {
            QuestEvent::QuestStarted { quest_id, .. } => quest_id,
            QuestEvent::ObjectiveProgress { quest_id, .. } => quest_id,
            QuestEvent::ObjectiveCompleted { quest_id, .. } => quest_id,
            QuestEvent::QuestCompleted { quest_id, .. } => quest_id,
            QuestEvent::QuestFailed { quest_id, .. } => quest_id,
        }
    }

    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            QuestEvent::QuestStarted { .. } => "quest_started",
            QuestEvent::ObjectiveProgress { .. } => "objective_progress",
            QuestEvent::ObjectiveCompleted { .. } => "objective_completed",
            QuestEvent::QuestCompleted { .. } => "quest_completed",
            QuestEvent::QuestFailed { .. } => "quest_failed",
        }
    }
}
