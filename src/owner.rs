//! Gameplay Owner
//!
//! The ability registry, inventory ledger and quest tracker attached to one
//! entity, plus timer routing and save capture/restore across all three.

use tracing::info;

use crate::ability::AbilityRegistry;
use crate::data::DefinitionRepository;
use crate::inventory::InventoryLedger;
use crate::quest::QuestTracker;
use crate::save::SaveData;
use crate::timer::{Clock, Scheduler, TimerHandle};

#[derive(Debug)]
pub struct GameplayOwner {
    id: String,
    pub abilities: AbilityRegistry,
    pub inventory: InventoryLedger,
    pub quests: QuestTracker,
}

impl GameplayOwner {
    pub fn new(id: impl Into<String>, inventory_slots: usize) -> Self {
        let id = id.into();
        Self {
            abilities: AbilityRegistry::new(id.clone()),
            inventory: InventoryLedger::new(id.clone(), inventory_slots),
            quests: QuestTracker::new(id.clone()),
            id,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Deliver an expired timer. Returns false if no subsystem owned it.
    pub fn handle_timer(&mut self, handle: TimerHandle, scheduler: &mut dyn Scheduler) -> bool {
        self.abilities.on_timer(handle, scheduler)
    }

    /// Snapshot every subsystem into a fresh save
    pub fn capture(&self, slot_display_name: &str, clock: &dyn Clock) -> SaveData {
        let mut data = SaveData::new(slot_display_name);
        data.abilities = self.abilities.snapshot(clock);
        data.inventory = self.inventory.snapshot();
        data.quests = self.quests.snapshot();
        data
    }

    /// Replace all runtime state with a save. Ids the repository does not know are skipped.
    pub fn restore(&mut self, data: &SaveData, repository: &DefinitionRepository, scheduler: &mut dyn Scheduler) {
        self.abilities.restore(&data.abilities, repository, scheduler);
        self.inventory.restore(&data.inventory, repository);
        self.quests.restore(&data.quests, repository);
        info!(
            target: "gameplay::save",
            "Restored {} from '{}' (saved {})", self.id, data.slot_display_name, data.saved_at
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::AbilityDefinition;
    use crate::inventory::ItemDefinition;
    use crate::quest::{ObjectiveDefinition, QuestDefinition};
    use crate::save::{MemorySaveStore, SaveStore};
    use crate::timer::ManualScheduler;

    fn repository() -> DefinitionRepository {
        let mut repository = DefinitionRepository::new();
        repository.insert_ability(AbilityDefinition::new("dash").with_cooldown_ms(5_000));
        repository.insert_item(ItemDefinition::new("arrow", 50));
        repository.insert_quest(
            QuestDefinition::new("archery")
                .with_objective(ObjectiveDefinition::new("targets", 3))
                .with_objective(ObjectiveDefinition::new("bullseye", 1)),
        );
        repository
    }

    #[test]
    fn test_cooldown_timer_is_routed() {
        let repository = repository();
        let mut scheduler = ManualScheduler::new();
        let mut owner = GameplayOwner::new("ranger", 10);
        let dash = repository.ability("dash").unwrap().clone();
        owner.abilities.grant(&dash);

        assert!(owner.abilities.try_activate(&dash, &mut scheduler));
        assert!(owner.abilities.is_on_cooldown("dash"));

        for handle in scheduler.advance(5_000) {
            assert!(owner.handle_timer(handle, &mut scheduler));
        }
        assert!(owner.abilities.can_activate("dash"));
    }

    #[test]
    fn test_capture_and_restore_through_store() {
        let repository = repository();
        let mut scheduler = ManualScheduler::new();
        let mut owner = GameplayOwner::new("ranger", 10);

        let dash = repository.ability("dash").unwrap().clone();
        owner.abilities.grant(&dash);
        owner.abilities.try_activate(&dash, &mut scheduler);
        scheduler.advance(2_000);

        owner.inventory.add_item(repository.item("arrow").unwrap(), 70);
        let quest = repository.quest("archery").unwrap().clone();
        owner.quests.start_quest(&quest);
        owner.quests.update_objective_progress(&quest, "targets", 2);

        let mut store = MemorySaveStore::new();
        store.save("slot1", &owner.capture("Slot 1", &scheduler)).unwrap();

        let mut later = ManualScheduler::starting_at(100_000);
        let mut restored = GameplayOwner::new("ranger", 10);
        restored.restore(&store.load("slot1").unwrap(), &repository, &mut later);

        assert_eq!(restored.abilities.cooldown_remaining_ms("dash", &later), 3_000);
        assert_eq!(restored.inventory.item_count_by_id("arrow"), 70);
        assert_eq!(restored.inventory.used_slots(), 2);
        assert_eq!(restored.quests.objectives("archery")[0].current(), 2);

        // The restored cooldown expires on the new clock
        for handle in later.advance(3_000) {
            restored.handle_timer(handle, &mut later);
        }
        assert!(restored.abilities.can_activate("dash"));
    }
}
