//! Ability runtime state
//!
//! Inactive -> Active -> OnCooldown -> Inactive. Cancelling, or ending an
//! ability without a cooldown, goes straight back to Inactive.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::definition::AbilityDefinition;
use crate::timer::{Clock, Scheduler, TimerHandle};

/// Lifecycle state of a granted ability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityState {
    Inactive,
    Active,
    OnCooldown,
}

impl AbilityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbilityState::Inactive => "inactive",
            AbilityState::Active => "active",
            AbilityState::OnCooldown => "on_cooldown",
        }
    }
}

/// Which pending timer of an ability a handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AbilityTimer {
    Cooldown,
    ActivationTimeout,
}

/// One granted ability. Owned by exactly one [`super::AbilityRegistry`].
#[derive(Debug)]
pub struct AbilityInstance {
    definition: Arc<AbilityDefinition>,
    state: AbilityState,
    /// World time the cooldown started; only meaningful while OnCooldown
    cooldown_started_ms: i64,
    cooldown_timer: Option<TimerHandle>,
    activation_timer: Option<TimerHandle>,
}

impl AbilityInstance {
    pub(crate) fn new(definition: Arc<AbilityDefinition>) -> Self {
        Self {
            definition,
            state: AbilityState::Inactive,
            cooldown_started_ms: 0,
            cooldown_timer: None,
            activation_timer: None,
        }
    }

    pub fn definition(&self) -> &Arc<AbilityDefinition> {
        &self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn state(&self) -> AbilityState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == AbilityState::Active
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.state == AbilityState::OnCooldown
    }

    pub fn can_activate(&self) -> bool {
        self.state == AbilityState::Inactive
    }

    /// Remaining cooldown in milliseconds (0 when not on cooldown)
    pub fn cooldown_remaining_ms(&self, clock: &dyn Clock) -> u64 {
        if self.state != AbilityState::OnCooldown || self.definition.cooldown_ms == 0 {
            return 0;
        }
        let elapsed = clock.now_ms() as i64 - self.cooldown_started_ms;
        (self.definition.cooldown_ms as i64 - elapsed).max(0) as u64
    }

    /// Enter Active and run the activation behavior.
    /// Returns true if the behavior committed the end before returning.
    pub(crate) fn activate(&mut self, scheduler: &mut dyn Scheduler) -> bool {
        self.state = AbilityState::Active;
        debug!(target: "gameplay::ability", "Ability '{}' activating", self.definition.id);

        let behavior = Arc::clone(&self.definition.behavior);
        let ended = {
            let mut activation = AbilityActivation {
                instance: &mut *self,
                scheduler: &mut *scheduler,
                ended: false,
            };
            behavior.activate(&mut activation);
            activation.ended
        };

        if self.state == AbilityState::Active && self.definition.activation_ms > 0 {
            self.activation_timer = Some(scheduler.schedule_once(self.definition.activation_ms));
        }

        ended
    }

    /// Leave the Active state. No-op (returns false) for any other state.
    pub(crate) fn end(&mut self, cancelled: bool, scheduler: &mut dyn Scheduler) -> bool {
        if self.state != AbilityState::Active {
            return false;
        }

        if let Some(handle) = self.activation_timer.take() {
            scheduler.cancel(handle);
        }

        self.definition.behavior.end(&self.definition, cancelled);

        if self.definition.cooldown_ms > 0 && !cancelled {
            self.start_cooldown(scheduler, self.definition.cooldown_ms);
            debug!(
                target: "gameplay::ability",
                "Ability '{}' cooling down for {}ms",
                self.definition.id,
                self.definition.cooldown_ms
            );
        } else {
            self.state = AbilityState::Inactive;
        }

        true
    }

    fn start_cooldown(&mut self, scheduler: &mut dyn Scheduler, remaining_ms: u64) {
        let elapsed = self.definition.cooldown_ms.saturating_sub(remaining_ms);
        self.cooldown_started_ms = scheduler.now_ms() as i64 - elapsed as i64;
        self.state = AbilityState::OnCooldown;
        self.cooldown_timer = Some(scheduler.schedule_once(remaining_ms));
    }

    pub(crate) fn cooldown_expired(&mut self) {
        self.cooldown_timer = None;
        if self.state == AbilityState::OnCooldown {
            self.state = AbilityState::Inactive;
            debug!(target: "gameplay::ability", "Ability '{}' cooldown expired", self.definition.id);
        }
    }

    pub(crate) fn timer_kind(&self, handle: TimerHandle) -> Option<AbilityTimer> {
        if self.cooldown_timer == Some(handle) {
            Some(AbilityTimer::Cooldown)
        } else if self.activation_timer == Some(handle) {
            Some(AbilityTimer::ActivationTimeout)
        } else {
            None
        }
    }

    pub(crate) fn clear_activation_timer(&mut self) {
        self.activation_timer = None;
    }

    /// Disarm every pending timer (removal, restore)
    pub(crate) fn release_timers(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.cooldown_timer.take() {
            scheduler.cancel(handle);
        }
        if let Some(handle) = self.activation_timer.take() {
            scheduler.cancel(handle);
        }
    }

    /// Put a freshly granted instance back on cooldown with `remaining_ms` left
    pub(crate) fn resume_cooldown(&mut self, scheduler: &mut dyn Scheduler, remaining_ms: u64) {
        if remaining_ms == 0 || self.definition.cooldown_ms == 0 {
            return;
        }
        let remaining_ms = remaining_ms.min(self.definition.cooldown_ms);
        self.start_cooldown(scheduler, remaining_ms);
    }
}

/// Handle given to [`super::AbilityBehavior::activate`] while the ability runs
pub struct AbilityActivation<'a> {
    instance: &'a mut AbilityInstance,
    scheduler: &'a mut dyn Scheduler,
    ended: bool,
}

impl AbilityActivation<'_> {
    pub fn definition(&self) -> &AbilityDefinition {
        &self.instance.definition
    }

    pub fn state(&self) -> AbilityState {
        self.instance.state
    }

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// Finish the ability normally and start its cooldown.
    /// The owning registry broadcasts the end once the behavior returns.
    pub fn commit_end(&mut self) -> bool {
        let ended = self.instance.end(false, &mut *self.scheduler);
        self.ended |= ended;
        ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::definition::ChanneledBehavior;
    use crate::timer::ManualScheduler;

    #[test]
    fn test_instant_activation_goes_on_cooldown() {
        let mut scheduler = ManualScheduler::new();
        let def = Arc::new(AbilityDefinition::new("fireball").with_cooldown_ms(5_000));
        let mut ability = AbilityInstance::new(def);

        assert!(ability.activate(&mut scheduler));
        assert_eq!(ability.state(), AbilityState::OnCooldown);
        assert_eq!(ability.cooldown_remaining_ms(&scheduler), 5_000);

        scheduler.advance(2_000);
        assert_eq!(ability.cooldown_remaining_ms(&scheduler), 3_000);
    }

    #[test]
    fn test_end_is_noop_when_not_active() {
        let mut scheduler = ManualScheduler::new();
        let def = Arc::new(AbilityDefinition::new("shield").with_behavior(Arc::new(ChanneledBehavior)));
        let mut ability = AbilityInstance::new(def);

        assert!(!ability.end(false, &mut scheduler));
        assert!(!ability.activate(&mut scheduler));
        assert!(ability.is_active());
        assert!(ability.end(true, &mut scheduler));
        assert!(!ability.end(true, &mut scheduler));
        assert_eq!(ability.state(), AbilityState::Inactive);
    }

    #[test]
    fn test_zero_cooldown_returns_to_inactive() {
        let mut scheduler = ManualScheduler::new();
        let def = Arc::new(AbilityDefinition::new("jump").with_cooldown_ms(0));
        let mut ability = AbilityInstance::new(def);

        ability.activate(&mut scheduler);
        assert!(ability.can_activate());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_resume_cooldown_clamps_to_definition() {
        let mut scheduler = ManualScheduler::starting_at(100);
        let def = Arc::new(AbilityDefinition::new("nova").with_cooldown_ms(4_000));
        let mut ability = AbilityInstance::new(def);

        ability.resume_cooldown(&mut scheduler, 10_000);
        assert!(ability.is_on_cooldown());
        assert_eq!(ability.cooldown_remaining_ms(&scheduler), 4_000);
    }
}
