use std::sync::Arc;

use serde::Serialize;

use super::definition::ItemDefinition;

/// A bounded quantity of one item, occupying one inventory slot
#[derive(Debug, Clone)]
pub struct ItemStack {
    definition: Arc<ItemDefinition>,
    quantity: i32,
}

impl ItemStack {
    /// Quantity is clamped to `1..=max_stack_size`
    pub fn new(definition: Arc<ItemDefinition>, quantity: i32) -> Self {
        let quantity = quantity.clamp(1, definition.max_stack_size);
        Self { definition, quantity }
    }

    pub fn definition(&self) -> &Arc<ItemDefinition> {
        &self.definition
    }

    pub fn item_id(&self) -> &str {
        &self.definition.id
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    /// Add up to `amount`. Returns how much actually fit.
    pub fn add_quantity(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let added = amount.min(self.remaining_capacity());
        self.quantity += added;
        added
    }

    /// Remove up to `amount`. Returns how much was taken.
    pub fn remove_quantity(&mut self, amount: i32) -> i32 {
        if amount <= 0 {
            return 0;
        }
        let removed = amount.min(self.quantity);
        self.quantity -= removed;
        removed
    }

    pub fn remaining_capacity(&self) -> i32 {
        (self.definition.max_stack_size - self.quantity).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.quantity >= self.definition.max_stack_size
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= 0
    }

    pub fn weight(&self) -> f32 {
        self.definition.weight * self.quantity as f32
    }

    pub fn to_update(&self) -> StackUpdate {
        StackUpdate {
            item_id: self.definition.id.clone(),
            quantity: self.quantity,
        }
    }
}

/// Serializable view of a stack for listeners and debugging output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackUpdate {
    pub item_id: String,
    pub quantity: i32,
}
