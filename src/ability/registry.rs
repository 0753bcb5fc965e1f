//! Ability Registry
//!
//! Per-owner set of granted abilities. Grants, activates, cancels and routes
//! cooldown timers back to the instance that armed them.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::definition::AbilityDefinition;
use super::events::AbilityEvent;
use super::instance::{AbilityInstance, AbilityState, AbilityTimer};
use crate::data::DefinitionRepository;
use crate::listeners::{ListenerId, Listeners};
use crate::save::{AbilityRecord, AbilitySnapshot};
use crate::timer::{Clock, Scheduler, TimerHandle};

/// Abilities granted to a single owner
#[derive(Debug)]
pub struct AbilityRegistry {
    owner: String,
    granted: Vec<AbilityInstance>,
    listeners: Listeners<AbilityEvent>,
}

impl AbilityRegistry {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            granted: Vec::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AbilityEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Grant an ability. Returns the existing instance if already granted.
    pub fn grant(&mut self, definition: &Arc<AbilityDefinition>) -> &AbilityInstance {
        if let Some(index) = self.position(&definition.id) {
            debug!(target: "gameplay::ability", "'{}' already granted to {}", definition.id, self.owner);
            return &self.granted[index];
        }

        self.granted.push(AbilityInstance::new(Arc::clone(definition)));
        info!(target: "gameplay::ability", "Granted ability '{}' to {}", definition.id, self.owner);
        self.listeners.emit(&AbilityEvent::Granted {
            owner: self.owner.clone(),
            ability_id: definition.id.clone(),
        });

        let index = self.granted.len() - 1;
        &self.granted[index]
    }

    /// Grant by definition id. Unknown ids are refused without mutation.
    pub fn grant_by_id(
        &mut self,
        repository: &DefinitionRepository,
        ability_id: &str,
    ) -> Option<&AbilityInstance> {
        match repository.ability(ability_id) {
            Some(definition) => {
                let definition = Arc::clone(definition);
                Some(self.grant(&definition))
            }
            None => {
                warn!(target: "gameplay::ability", "grant: unknown ability '{}'", ability_id);
                None
            }
        }
    }

    /// Remove a granted ability, cancelling it first if it is active
    pub fn remove(&mut self, definition: &AbilityDefinition, scheduler: &mut dyn Scheduler) -> bool {
        let Some(index) = self.position(&definition.id) else {
            return false;
        };

        let mut ability = self.granted.remove(index);
        if ability.is_active() {
            ability.end(true, scheduler);
        }
        ability.release_timers(scheduler);

        info!(target: "gameplay::ability", "Removed ability '{}' from {}", definition.id, self.owner);
        true
    }

    /// Try to activate a granted ability.
    /// Returns false if it is not granted or not currently activatable.
    pub fn try_activate(&mut self, definition: &AbilityDefinition, scheduler: &mut dyn Scheduler) -> bool {
        let Some(index) = self.position(&definition.id) else {
            warn!(target: "gameplay::ability", "try_activate: '{}' not granted to {}", definition.id, self.owner);
            return false;
        };

        let state = self.granted[index].state();
        if state != AbilityState::Inactive {
            debug!(
                target: "gameplay::ability",
                "try_activate: '{}' cannot activate (state={})",
                definition.id,
                state.as_str()
            );
            return false;
        }

        // Listeners hear about the activation before the behavior runs.
        self.listeners.emit(&AbilityEvent::Activated {
            owner: self.owner.clone(),
            ability_id: definition.id.clone(),
        });

        if self.granted[index].activate(scheduler) {
            self.emit_ended(&definition.id, false);
        }
        true
    }

    /// Cancel an active ability. Cancelling skips the cooldown.
    pub fn cancel(&mut self, definition: &AbilityDefinition, scheduler: &mut dyn Scheduler) -> bool {
        let Some(index) = self.position(&definition.id) else {
            return false;
        };

        if self.granted[index].end(true, scheduler) {
            self.emit_ended(&definition.id, true);
            true
        } else {
            false
        }
    }

    /// Cancel every active ability. Returns how many were cancelled.
    pub fn cancel_all(&mut self, scheduler: &mut dyn Scheduler) -> usize {
        let mut cancelled = 0;
        for index in 0..self.granted.len() {
            if self.granted[index].end(true, scheduler) {
                let ability_id = self.granted[index].id().to_string();
                self.emit_ended(&ability_id, true);
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Finish an active ability normally (starts its cooldown)
    pub fn commit_end(&mut self, definition: &AbilityDefinition, scheduler: &mut dyn Scheduler) -> bool {
        let Some(index) = self.position(&definition.id) else {
            return false;
        };

        if self.granted[index].end(false, scheduler) {
            self.emit_ended(&definition.id, false);
            true
        } else {
            false
        }
    }

    /// Deliver an expired timer. Returns false if no ability owns the handle.
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut dyn Scheduler) -> bool {
        let Some((index, kind)) = self
            .granted
            .iter()
            .enumerate()
            .find_map(|(i, ability)| ability.timer_kind(handle).map(|kind| (i, kind)))
        else {
            return false;
        };

        match kind {
            AbilityTimer::Cooldown => self.granted[index].cooldown_expired(),
            AbilityTimer::ActivationTimeout => {
                let ability = &mut self.granted[index];
                ability.clear_activation_timer();
                if ability.end(false, scheduler) {
                    let ability_id = ability.id().to_string();
                    debug!(target: "gameplay::ability", "Ability '{}' reached its activation limit", ability_id);
                    self.emit_ended(&ability_id, false);
                }
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn has_ability(&self, ability_id: &str) -> bool {
        self.position(ability_id).is_some()
    }

    pub fn get(&self, ability_id: &str) -> Option<&AbilityInstance> {
        self.granted.iter().find(|a| a.id() == ability_id)
    }

    pub fn state(&self, ability_id: &str) -> Option<AbilityState> {
        self.get(ability_id).map(AbilityInstance::state)
    }

    pub fn is_active(&self, ability_id: &str) -> bool {
        self.get(ability_id).is_some_and(AbilityInstance::is_active)
    }

    pub fn is_on_cooldown(&self, ability_id: &str) -> bool {
        self.get(ability_id).is_some_and(AbilityInstance::is_on_cooldown)
    }

    pub fn can_activate(&self, ability_id: &str) -> bool {
        self.get(ability_id).is_some_and(AbilityInstance::can_activate)
    }

    /// Remaining cooldown in milliseconds (0 if not granted or not cooling down)
    pub fn cooldown_remaining_ms(&self, ability_id: &str, clock: &dyn Clock) -> u64 {
        self.get(ability_id)
            .map(|ability| ability.cooldown_remaining_ms(clock))
            .unwrap_or(0)
    }

    /// Granted abilities in grant order
    pub fn granted(&self) -> &[AbilityInstance] {
        &self.granted
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn snapshot(&self, clock: &dyn Clock) -> AbilitySnapshot {
        AbilitySnapshot {
            abilities: self
                .granted
                .iter()
                .map(|ability| AbilityRecord {
                    ability_id: ability.id().to_string(),
                    state: ability.state(),
                    cooldown_remaining_ms: ability.cooldown_remaining_ms(clock),
                })
                .collect(),
        }
    }

    /// Replace the granted set with a snapshot.
    /// Active abilities come back Inactive; their behavior is not re-run.
    pub fn restore(
        &mut self,
        snapshot: &AbilitySnapshot,
        repository: &DefinitionRepository,
        scheduler: &mut dyn Scheduler,
    ) {
        for ability in &mut self.granted {
            ability.release_timers(scheduler);
        }
        self.granted.clear();

        for record in &snapshot.abilities {
            let Some(definition) = repository.ability(&record.ability_id) else {
                warn!(target: "gameplay::ability", "restore: unknown ability '{}', skipping", record.ability_id);
                continue;
            };
            if self.has_ability(&record.ability_id) {
                warn!(target: "gameplay::ability", "restore: duplicate ability '{}', skipping", record.ability_id);
                continue;
            }

            let mut ability = AbilityInstance::new(Arc::clone(definition));
            if record.state == AbilityState::OnCooldown {
                ability.resume_cooldown(scheduler, record.cooldown_remaining_ms);
            }
            self.granted.push(ability);
        }

        info!(target: "gameplay::ability", "Restored {} abilities for {}", self.granted.len(), self.owner);
    }

    // ------------------------------------------------------------------

    fn position(&self, ability_id: &str) -> Option<usize> {
        self.granted.iter().position(|a| a.id() == ability_id)
    }

    fn emit_ended(&mut self, ability_id: &str, cancelled: bool) {
        self.listeners.emit(&AbilityEvent::Ended {
            owner: self.owner.clone(),
            ability_id: ability_id.to_string(),
            cancelled,
        });
    }
}
