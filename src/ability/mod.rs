//! Ability System
//!
//! Grant, activate, cancel and cool down per-owner abilities. Definitions are
//! shared templates; each owner holds its own runtime instances.

pub mod definition;
pub mod events;
pub mod instance;
pub mod registry;

pub use definition::{AbilityBehavior, AbilityDefinition, ChanneledBehavior, InstantBehavior, RawAbilityDefinition};
pub use events::AbilityEvent;
pub use instance::{AbilityActivation, AbilityInstance, AbilityState};
pub use registry::AbilityRegistry;
