//! Ability Event Types

use serde::Serialize;

/// Notifications broadcast by an [`super::AbilityRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AbilityEvent {
    Granted {
        owner: String,
        ability_id: String,
    },
    /// Sent before the activation behavior runs
    Activated {
        owner: String,
        ability_id: String,
    },
    Ended {
        owner: String,
        ability_id: String,
        cancelled: bool,
    },
}

impl AbilityEvent {
    pub fn ability_id(&self) -> &str {
        match self {
            AbilityEvent::Granted { ability_id, .. } => ability_id,
            AbilityEvent::Activated { ability_id, .. } => ability_id,
            AbilityEvent::Ended { ability_id, .. } => ability_id,
        }
    }

    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            AbilityEvent::Granted { .. } => "ability_granted",
            AbilityEvent::Activated { .. } => "ability_activated",
            AbilityEvent::Ended { .. } => "ability_ended",
        }
    }
}
