//! Quest Definition Structures
//!
//! These structures are deserialized from TOML quest files.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// A quest definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    #[serde(alias = "name")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    /// When false the quest only completes through a manual call
    #[serde(default = "default_require_all")]
    pub require_all_objectives: bool,
    #[serde(default)]
    pub objectives: Vec<RawObjective>,
}

/// Raw objective as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "count", default = "default_required")]
    pub required: i32,
}

fn default_require_all() -> bool {
    true
}

fn default_required() -> i32 {
    1
}

// ============================================================================
// Objective Hooks
// ============================================================================

/// Hook invoked whenever an objective's progress counter moves
pub trait ObjectiveBehavior: Debug + Send + Sync {
    fn progress_changed(&self, _objective: &ObjectiveDefinition, _current: i32) {}
}

/// Objective with no custom progress handling
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObjective;

impl ObjectiveBehavior for NoopObjective {}

// ============================================================================
// Resolved Quest Structures (after parsing)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ObjectiveDefinition {
    pub id: String,
    pub description: String,
    /// Progress needed to complete (>= 1)
    pub required: i32,
    pub behavior: Arc<dyn ObjectiveBehavior>,
}

impl ObjectiveDefinition {
    pub fn new(id: &str, required: i32) -> Self {
        Self {
            id: id.to_string(),
            description: String::new(),
            required: required.max(1),
            behavior: Arc::new(NoopObjective),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn ObjectiveBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn from_raw(quest_id: &str, raw: &RawObjective) -> Result<Self, DataError> {
        if raw.required < 1 {
            return Err(DataError::invalid(
                quest_id,
                format!("objective '{}' requires {} (must be >= 1)", raw.id, raw.required),
            ));
        }
        Ok(Self::new(&raw.id, raw.required).with_description(&raw.description))
    }
}

/// Rule deciding whether finishing every objective completes the quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Complete automatically once every objective is complete
    #[default]
    RequireAll,
    /// Only `complete_quest` finishes the quest
    ManualOnly,
}

/// A fully resolved quest definition
#[derive(Debug, Clone)]
pub struct QuestDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    pub objectives: Vec<ObjectiveDefinition>,
    pub completion: CompletionPolicy,
}

impl QuestDefinition {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            objectives: Vec::new(),
            completion: CompletionPolicy::RequireAll,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_objective(mut self, objective: ObjectiveDefinition) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_completion(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    /// Create a QuestDefinition from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, DataError> {
        if raw.id.is_empty() {
            return Err(DataError::invalid("<unnamed>", "quest id is empty"));
        }

        let objectives = raw
            .objectives
            .iter()
            .map(|o| ObjectiveDefinition::from_raw(&raw.id, o))
            .collect::<Result<Vec<_>, _>>()?;

        if objectives.is_empty() {
            return Err(DataError::invalid(&raw.id, "quest has no objectives"));
        }

        let mut seen = HashSet::new();
        for objective in &objectives {
            if !seen.insert(objective.id.as_str()) {
                return Err(DataError::invalid(
                    &raw.id,
                    format!("duplicate objective id '{}'", objective.id),
                ));
            }
        }

        Ok(Self {
            id: raw.id.clone(),
            title: raw.title.clone().unwrap_or_else(|| raw.id.clone()),
            description: raw.description.clone(),
            objectives,
            completion: if raw.require_all_objectives {
                CompletionPolicy::RequireAll
            } else {
                CompletionPolicy::ManualOnly
            },
        })
    }

    /// Get objective by ID
    pub fn get_objective(&self, id: &str) -> Option<&ObjectiveDefinition> {
        self.objectives.iter().find(|o| o.id == id)
    }

    pub fn objective_index(&self, id: &str) -> Option<usize> {
        self.objectives.iter().position(|o| o.id == id)
    }
}
