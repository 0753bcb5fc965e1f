//! Ability Definition Structures
//!
//! Abilities are authored in TOML (see `data/abilities`) or built in code.
//! Behavior is attached by name from the definition repository.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::instance::AbilityActivation;
use crate::error::DataError;

/// Authored logic for an ability.
///
/// The default `activate` ends the ability right away, which makes every
/// ability without custom logic an instant one.
pub trait AbilityBehavior: fmt::Debug + Send + Sync {
    /// Runs right after the ability enters the Active state
    fn activate(&self, activation: &mut AbilityActivation<'_>) {
        activation.commit_end();
    }

    /// Runs exactly once whenever the ability leaves the Active state
    fn end(&self, _ability: &AbilityDefinition, _cancelled: bool) {}
}

/// Ends on activation. The default for every ability.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantBehavior;

impl AbilityBehavior for InstantBehavior {}

/// Stays active until the owner commits the end or the activation window runs out
#[derive(Debug, Default, Clone, Copy)]
pub struct ChanneledBehavior;

impl AbilityBehavior for ChanneledBehavior {
    fn activate(&self, _activation: &mut AbilityActivation<'_>) {}
}

/// Raw ability data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawAbilityDefinition {
    pub display_name: Option<String>,
    pub cooldown_ms: Option<u64>,
    #[serde(default)]
    pub activation_ms: u64,
    /// Behavior name registered with the definition repository
    pub behavior: Option<String>,
}

fn default_cooldown_ms() -> u64 {
    1_000
}

/// Immutable ability template shared by every owner it is granted to
#[derive(Debug, Clone)]
pub struct AbilityDefinition {
    pub id: String,
    pub display_name: String,
    /// Time spent on cooldown after a natural end
    pub cooldown_ms: u64,
    /// Maximum time the ability may stay active (0 = instant)
    pub activation_ms: u64,
    pub behavior: Arc<dyn AbilityBehavior>,
}

impl AbilityDefinition {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            cooldown_ms: default_cooldown_ms(),
            activation_ms: 0,
            behavior: Arc::new(InstantBehavior),
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    pub fn with_activation_ms(mut self, activation_ms: u64) -> Self {
        self.activation_ms = activation_ms;
        self
    }

    pub fn with_behavior(mut self, behavior: Arc<dyn AbilityBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Resolve a raw TOML entry. `behavior` is looked up by the caller.
    pub fn from_raw(
        id: &str,
        raw: &RawAbilityDefinition,
        behavior: Arc<dyn AbilityBehavior>,
    ) -> Result<Self, DataError> {
        if id.is_empty() {
            return Err(DataError::invalid(id, "ability id is empty"));
        }

        Ok(Self {
            id: id.to_string(),
            display_name: raw.display_name.clone().unwrap_or_else(|| id.to_string()),
            cooldown_ms: raw.cooldown_ms.unwrap_or_else(default_cooldown_ms),
            activation_ms: raw.activation_ms,
            behavior,
        })
    }

    pub fn is_instant(&self) -> bool {
        self.activation_ms == 0
    }
}
