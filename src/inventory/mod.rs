//! Inventory System
//!
//! Slot-limited stacks of shared item definitions.

pub mod definition;
pub mod events;
pub mod ledger;
pub mod stack;

pub use definition::{ItemDefinition, RawItemDefinition};
pub use events::InventoryEvent;
pub use ledger::{InventoryLedger, UNLIMITED_SLOTS};
pub use stack::{ItemStack, StackUpdate};
