//! Inventory Ledger
//!
//! Ordered sequence of item stacks with an optional slot limit. Adding tops up
//! existing stacks front to back before opening new ones; removing drains
//! stacks from the back of the sequence toward the front.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::definition::ItemDefinition;
use super::events::InventoryEvent;
use super::stack::{ItemStack, StackUpdate};
use crate::data::DefinitionRepository;
use crate::listeners::{ListenerId, Listeners};
use crate::save::{InventorySnapshot, StackRecord};

/// Slot limit value meaning "no limit"
pub const UNLIMITED_SLOTS: usize = 0;

/// Most units of one item a ledger will hold
const MAX_HELD: i64 = i32::MAX as i64;

#[derive(Debug)]
pub struct InventoryLedger {
    owner: String,
    /// Maximum number of stacks (0 = unlimited)
    slot_limit: usize,
    stacks: Vec<ItemStack>,
    listeners: Listeners<InventoryEvent>,
}

impl InventoryLedger {
    pub fn new(owner: impl Into<String>, slot_limit: usize) -> Self {
        Self {
            owner: owner.into(),
            slot_limit,
            stacks: Vec::new(),
            listeners: Listeners::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn slot_limit(&self) -> usize {
        self.slot_limit
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&InventoryEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Check whether `quantity` units would fit, without changing anything
    pub fn can_add(&self, definition: &ItemDefinition, quantity: i32) -> bool {
        if quantity <= 0 {
            return false;
        }

        if self.held(&definition.id) + i64::from(quantity) > MAX_HELD {
            return false;
        }

        let mut remaining = i64::from(quantity);
        for stack in self.matching(definition) {
            remaining -= i64::from(stack.remaining_capacity());
            if remaining <= 0 {
                return true;
            }
        }

        let max_stack = i64::from(definition.max_stack_size.max(1));
        let new_stacks_needed = (remaining + max_stack - 1) / max_stack;
        match self.free_slots() {
            Some(free) => new_stacks_needed <= i64::try_from(free).unwrap_or(i64::MAX),
            None => true,
        }
    }

    /// Total units of an item across all stacks, capped at `i32::MAX`
    pub fn item_count(&self, definition: &ItemDefinition) -> i32 {
        self.item_count_by_id(&definition.id)
    }

    pub fn item_count_by_id(&self, item_id: &str) -> i32 {
        i32::try_from(self.held(item_id)).unwrap_or(i32::MAX)
    }

    pub fn has_item(&self, definition: &ItemDefinition, quantity: i32) -> bool {
        self.item_count(definition) >= quantity
    }

    /// All stacks in slot order
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    pub fn used_slots(&self) -> usize {
        self.stacks.len()
    }

    /// Free slots, or `None` when the ledger is unlimited
    pub fn free_slots(&self) -> Option<usize> {
        if self.slot_limit == UNLIMITED_SLOTS {
            None
        } else {
            Some(self.slot_limit.saturating_sub(self.stacks.len()))
        }
    }

    /// Combined weight of every held unit
    pub fn total_weight(&self) -> f32 {
        self.stacks.iter().map(ItemStack::weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Get inventory as a serializable update
    pub fn to_update(&self) -> Vec<StackUpdate> {
        self.stacks.iter().map(ItemStack::to_update).collect()
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add items, topping up existing stacks first.
    ///
    /// Returns false when not everything fit. Whatever was placed before the
    /// slot limit was hit stays in the inventory.
    pub fn add_item(&mut self, definition: &Arc<ItemDefinition>, quantity: i32) -> bool {
        if quantity <= 0 {
            warn!(
                target: "gameplay::inventory",
                "add_item: invalid quantity {} of '{}'", quantity, definition.id
            );
            return false;
        }

        if self.held(&definition.id) + i64::from(quantity) > MAX_HELD {
            warn!(
                target: "gameplay::inventory",
                "add_item: {} x {} would overflow the held count", quantity, definition.id
            );
            return false;
        }

        let mut remaining = quantity;

        // 1. Top up existing partial stacks, in slot order
        for stack in self.stacks.iter_mut() {
            if remaining <= 0 {
                break;
            }
            if stack.item_id() == definition.id && !stack.is_full() {
                remaining -= stack.add_quantity(remaining);
            }
        }

        // 2. Open new stacks for the rest
        while remaining > 0 {
            if self.slot_limit != UNLIMITED_SLOTS && self.stacks.len() >= self.slot_limit {
                warn!(
                    target: "gameplay::inventory",
                    "add_item: inventory full ({} slots), could not add {} x {}",
                    self.slot_limit, remaining, definition.id
                );
                let added = quantity - remaining;
                if added > 0 {
                    self.listeners.emit(&InventoryEvent::PartialAdd {
                        owner: self.owner.clone(),
                        item_id: definition.id.clone(),
                        added,
                        requested: quantity,
                    });
                    self.emit_changed();
                }
                return false;
            }

            let to_add = remaining.min(definition.max_stack_size);
            self.stacks.push(ItemStack::new(Arc::clone(definition), to_add));
            remaining -= to_add;
        }

        debug!(target: "gameplay::inventory", "add_item: added {} x {} for {}", quantity, definition.id, self.owner);
        self.listeners.emit(&InventoryEvent::ItemAdded {
            owner: self.owner.clone(),
            item_id: definition.id.clone(),
            quantity,
        });
        self.emit_changed();
        true
    }

    /// Remove items, newest stacks first. Fails without change if not enough are held.
    pub fn remove_item(&mut self, definition: &ItemDefinition, quantity: i32) -> bool {
        if quantity <= 0 {
            warn!(
                target: "gameplay::inventory",
                "remove_item: invalid quantity {} of '{}'", quantity, definition.id
            );
            return false;
        }

        let held = self.held(&definition.id);
        if held < i64::from(quantity) {
            warn!(
                target: "gameplay::inventory",
                "remove_item: not enough {} (need {}, have {})",
                definition.id, quantity, held
            );
            return false;
        }

        self.drain(&definition.id, quantity);

        debug!(target: "gameplay::inventory", "remove_item: removed {} x {} for {}", quantity, definition.id, self.owner);
        self.listeners.emit(&InventoryEvent::ItemRemoved {
            owner: self.owner.clone(),
            item_id: definition.id.clone(),
            quantity,
        });
        self.emit_changed();
        true
    }

    /// Consume one unit of a usable item
    pub fn use_item(&mut self, definition: &ItemDefinition) -> bool {
        if !definition.usable {
            warn!(target: "gameplay::inventory", "use_item: '{}' cannot be used", definition.id);
            return false;
        }
        if !self.has_item(definition, 1) {
            warn!(target: "gameplay::inventory", "use_item: {} holds no '{}'", self.owner, definition.id);
            return false;
        }

        self.listeners.emit(&InventoryEvent::ItemUsed {
            owner: self.owner.clone(),
            item_id: definition.id.clone(),
        });
        self.remove_item(definition, 1)
    }

    /// Drop every stack
    pub fn clear(&mut self) {
        self.stacks.clear();
        debug!(target: "gameplay::inventory", "clear: inventory of {} emptied", self.owner);
        self.emit_changed();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            stacks: self
                .stacks
                .iter()
                .map(|stack| StackRecord {
                    item_id: stack.item_id().to_string(),
                    quantity: stack.quantity(),
                })
                .collect(),
        }
    }

    /// Replace the stack sequence with a snapshot, keeping slot order.
    /// Unknown items and stacks beyond the slot limit are dropped.
    pub fn restore(&mut self, snapshot: &InventorySnapshot, repository: &DefinitionRepository) {
        self.stacks.clear();

        for record in &snapshot.stacks {
            if record.quantity <= 0 {
                continue;
            }
            let Some(definition) = repository.item(&record.item_id) else {
                warn!(target: "gameplay::inventory", "restore: unknown item '{}', skipping", record.item_id);
                continue;
            };
            if self.slot_limit != UNLIMITED_SLOTS && self.stacks.len() >= self.slot_limit {
                warn!(
                    target: "gameplay::inventory",
                    "restore: slot limit {} reached, dropping {} x {}",
                    self.slot_limit, record.quantity, record.item_id
                );
                continue;
            }
            self.stacks.push(ItemStack::new(Arc::clone(definition), record.quantity));
        }

        info!(target: "gameplay::inventory", "Restored {} stacks for {}", self.stacks.len(), self.owner);
        self.emit_changed();
    }

    // ------------------------------------------------------------------

    /// Units of `item_id` held, summed wide so oversized restores cannot overflow
    fn held(&self, item_id: &str) -> i64 {
        self.stacks
            .iter()
            .filter(|s| s.item_id() == item_id)
            .map(|s| i64::from(s.quantity()))
            .sum()
    }

    fn matching<'a>(&'a self, definition: &'a ItemDefinition) -> impl Iterator<Item = &'a ItemStack> + 'a {
        self.stacks.iter().filter(move |s| s.item_id() == definition.id)
    }

    /// Take `quantity` units of `item_id` from the back of the sequence
    fn drain(&mut self, item_id: &str, quantity: i32) {
        let mut remaining = quantity;
        let mut index = self.stacks.len();
        while index > 0 && remaining > 0 {
            index -= 1;
            let stack = &mut self.stacks[index];
            if stack.item_id() != item_id {
                continue;
            }
            remaining -= stack.remove_quantity(remaining);
            if stack.is_empty() {
                self.stacks.remove(index);
            }
        }
    }

    fn emit_changed(&mut self) {
        self.listeners.emit(&InventoryEvent::InventoryChanged {
            owner: self.owner.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn potion() -> Arc<ItemDefinition> {
        Arc::new(ItemDefinition::new("potion", 10).with_usable(true).with_weight(0.5))
    }

    fn quantities(ledger: &InventoryLedger) -> Vec<(String, i32)> {
        ledger
            .stacks()
            .iter()
            .map(|s| (s.item_id().to_string(), s.quantity()))
            .collect()
    }

    fn recorder(ledger: &mut InventoryLedger) -> Rc<RefCell<Vec<InventoryEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        ledger.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_add_fills_two_slots() {
        let mut ledger = InventoryLedger::new("hero", 2);
        let def = potion();

        assert!(ledger.can_add(&def, 15));
        assert!(ledger.add_item(&def, 15));
        assert_eq!(ledger.used_slots(), 2);
        assert_eq!(quantities(&ledger), vec![("potion".into(), 10), ("potion".into(), 5)]);
    }

    #[test]
    fn test_partial_add_keeps_placed_items() {
        let mut ledger = InventoryLedger::new("hero", 2);
        let events = recorder(&mut ledger);
        let def = potion();

        assert!(!ledger.can_add(&def, 25));
        assert!(!ledger.add_item(&def, 25));
        assert_eq!(ledger.item_count(&def), 20);
        assert_eq!(quantities(&ledger), vec![("potion".into(), 10), ("potion".into(), 10)]);

        let types: Vec<_> = events.borrow().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["partial_add", "inventory_changed"]);
    }

    #[test]
    fn test_can_add_huge_quantity_is_refused() {
        let ledger = InventoryLedger::new("hero", 2);
        assert!(!ledger.can_add(&potion(), i32::MAX));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_can_add_counts_spare_capacity_first() {
        let mut ledger = InventoryLedger::new("hero", 2);
        let def = potion();
        let rope = Arc::new(ItemDefinition::new("rope", 1));
        ledger.add_item(&def, 5);
        ledger.add_item(&rope, 1);

        assert!(ledger.can_add(&def, 5));
        assert!(!ledger.can_add(&def, 6));
        assert_eq!(quantities(&ledger), vec![("potion".into(), 5), ("rope".into(), 1)]);
    }

    #[test]
    fn test_held_count_cannot_pass_i32_max() {
        let mut ledger = InventoryLedger::new("hero", UNLIMITED_SLOTS);
        let coin = Arc::new(ItemDefinition::new("coin", i32::MAX));

        assert!(ledger.add_item(&coin, i32::MAX));
        assert!(!ledger.can_add(&coin, 1));
        assert!(!ledger.add_item(&coin, 1));
        assert_eq!(ledger.item_count(&coin), i32::MAX);
        assert_eq!(ledger.used_slots(), 1);

        assert!(ledger.remove_item(&coin, i32::MAX));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_add_to_full_inventory_fires_nothing() {
        let mut ledger = InventoryLedger::new("hero", 1);
        let def = potion();
        ledger.add_item(&def, 10);
        let events = recorder(&mut ledger);

        assert!(!ledger.add_item(&def, 1));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_add_rejects_non_positive_quantity() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let events = recorder(&mut ledger);

        assert!(!ledger.add_item(&potion(), 0));
        assert!(!ledger.add_item(&potion(), -3));
        assert!(ledger.is_empty());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_add_tops_up_in_order() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let def = potion();
        let rope = Arc::new(ItemDefinition::new("rope", 1));
        ledger.add_item(&def, 4);
        ledger.add_item(&rope, 1);
        ledger.add_item(&def, 10);

        assert_eq!(
            quantities(&ledger),
            vec![("potion".into(), 10), ("rope".into(), 1), ("potion".into(), 4)]
        );
        ledger.add_item(&def, 3);
        assert_eq!(ledger.stacks()[2].quantity(), 7);
    }

    #[test]
    fn test_remove_more_than_held_changes_nothing() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let def = potion();
        ledger.add_item(&def, 7);
        let events = recorder(&mut ledger);

        assert!(!ledger.remove_item(&def, 8));
        assert_eq!(ledger.item_count(&def), 7);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_remove_drains_newest_first() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let def = potion();
        ledger.add_item(&def, 25);

        assert!(ledger.remove_item(&def, 8));
        assert_eq!(quantities(&ledger), vec![("potion".into(), 10), ("potion".into(), 7)]);
    }

    #[test]
    fn test_add_then_remove_restores_composition() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let def = potion();
        let rope = Arc::new(ItemDefinition::new("rope", 1));
        ledger.add_item(&def, 3);
        ledger.add_item(&rope, 1);
        let before = quantities(&ledger);

        // Fits in the existing potion stack
        ledger.add_item(&def, 6);
        ledger.remove_item(&def, 6);
        assert_eq!(quantities(&ledger), before);

        // Spills into new stacks, then everything of it is removed
        let mut only_potions = InventoryLedger::new("hero", 0);
        only_potions.add_item(&def, 23);
        only_potions.remove_item(&def, 23);
        assert_eq!(only_potions.item_count(&def), 0);
        assert!(only_potions.is_empty());
    }

    #[test]
    fn test_use_item() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let events = recorder(&mut ledger);
        let def = potion();
        let rope = Arc::new(ItemDefinition::new("rope", 1));

        assert!(!ledger.use_item(&def));
        ledger.add_item(&def, 2);
        ledger.add_item(&rope, 1);
        assert!(!ledger.use_item(&rope));
        assert!(ledger.use_item(&def));
        assert_eq!(ledger.item_count(&def), 1);
        assert!(events.borrow().iter().any(|e| e.event_type() == "item_used"));
    }

    #[test]
    fn test_weight_and_clear() {
        let mut ledger = InventoryLedger::new("hero", 0);
        let events = recorder(&mut ledger);
        ledger.add_item(&potion(), 4);
        assert!((ledger.total_weight() - 2.0).abs() < f32::EPSILON);

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(
            events.borrow().last(),
            Some(&InventoryEvent::InventoryChanged { owner: "hero".into() })
        );
    }

    #[test]
    fn test_unlimited_can_add() {
        let ledger = InventoryLedger::new("hero", UNLIMITED_SLOTS);
        assert!(ledger.can_add(&potion(), 10_000));
        assert!(!ledger.can_add(&potion(), 0));
        assert_eq!(ledger.free_slots(), None);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut repository = DefinitionRepository::new();
        let def = repository.insert_item(ItemDefinition::new("potion", 10));
        let mut ledger = InventoryLedger::new("hero", 3);
        ledger.add_item(&def, 14);

        let snapshot = ledger.snapshot();
        let mut restored = InventoryLedger::new("hero", 3);
        restored.restore(&snapshot, &repository);

        assert_eq!(quantities(&restored), quantities(&ledger));
    }
}
