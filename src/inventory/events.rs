//! Inventory Event Types

use serde::Serialize;

/// Notifications broadcast by an [`super::InventoryLedger`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum InventoryEvent {
    /// The full requested quantity was placed
    ItemAdded {
        owner: String,
        item_id: String,
        quantity: i32,
    },
    /// The slot limit was hit after part of the request was placed
    PartialAdd {
        owner: String,
        item_id: String,
        added: i32,
        requested: i32,
    },
    ItemRemoved {
        owner: String,
        item_id: String,
        quantity: i32,
    },
    ItemUsed {
        owner: String,
        item_id: String,
    },
    /// The stack sequence changed in any way
    InventoryChanged {
        owner: String,
    },
}

impl InventoryEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemAdded { .. } => "item_added",
            InventoryEvent::PartialAdd { .. } => "partial_add",
            InventoryEvent::ItemRemoved { .. } => "item_removed",
            InventoryEvent::ItemUsed { .. } => "item_used",
            InventoryEvent::InventoryChanged { .. } => "inventory_changed",
        }
    }
}
