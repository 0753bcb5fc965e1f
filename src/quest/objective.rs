use serde::{Deserialize, Serialize};

use super::definition::ObjectiveDefinition;

/// Status of a single objective within an active quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveState {
    Inactive,
    Active,
    Completed,
    Failed,
}

impl ObjectiveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveState::Inactive => "inactive",
            ObjectiveState::Active => "active",
            ObjectiveState::Completed => "completed",
            ObjectiveState::Failed => "failed",
        }
    }
}

/// Owner-exclusive copy of an objective definition plus its progress
#[derive(Debug, Clone)]
pub struct ObjectiveInstance {
    definition: ObjectiveDefinition,
    current: i32,
    state: ObjectiveState,
}

impl ObjectiveInstance {
    pub fn from_definition(definition: &ObjectiveDefinition) -> Self {
        Self {
            definition: definition.clone(),
            current: 0,
            state: ObjectiveState::Inactive,
        }
    }

    pub fn definition(&self) -> &ObjectiveDefinition {
        &self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn required(&self) -> i32 {
        self.definition.required
    }

    pub fn state(&self) -> ObjectiveState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == ObjectiveState::Completed
    }

    /// Progress as a fraction in [0, 1]
    pub fn progress_fraction(&self) -> f32 {
        if self.definition.required <= 0 {
            return 1.0;
        }
        (self.current as f32 / self.definition.required as f32).clamp(0.0, 1.0)
    }

    pub(crate) fn activate(&mut self) {
        self.current = 0;
        self.state = ObjectiveState::Active;
    }

    /// Add progress and return true if newly completed
    pub(crate) fn add_progress(&mut self, delta: i32) -> bool {
        if self.state != ObjectiveState::Active || delta <= 0 {
            return false;
        }

        self.current = self.current.saturating_add(delta).min(self.definition.required);
        self.definition.behavior.progress_changed(&self.definition, self.current);

        if self.current >= self.definition.required {
            self.state = ObjectiveState::Completed;
            true
        } else {
            false
        }
    }

    pub(crate) fn fail(&mut self) {
        if self.state != ObjectiveState::Completed {
            self.state = ObjectiveState::Failed;
        }
    }

    /// Load saved progress; the counter is clamped to the requirement
    pub(crate) fn restore(&mut self, current: i32, state: ObjectiveState) {
        self.current = current.clamp(0, self.definition.required);
        self.state = state;
    }
}
