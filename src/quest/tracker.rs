//! Quest Tracker
//!
//! Per-owner quest progress: in-flight quests with their objective instances,
//! plus the sets of completed and failed quest ids.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::definition::{CompletionPolicy, QuestDefinition};
use super::events::QuestEvent;
use super::objective::ObjectiveInstance;
use crate::data::DefinitionRepository;
use crate::listeners::{ListenerId, Listeners};
use crate::save::{ActiveQuestRecord, ObjectiveRecord, QuestSnapshot};

/// Game-side reactions to quest progress
pub trait QuestHooks {
    /// Called when the objective at `index` reaches its requirement
    fn objective_completed(&mut self, _quest: &QuestDefinition, _index: usize) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoQuestHooks;

impl QuestHooks for NoQuestHooks {}

/// A started quest and its owner-exclusive objectives
#[derive(Debug, Clone)]
pub struct ActiveQuest {
    definition: Arc<QuestDefinition>,
    objectives: Vec<ObjectiveInstance>,
}

impl ActiveQuest {
    fn start(definition: &Arc<QuestDefinition>) -> Self {
        let objectives = definition
            .objectives
            .iter()
            .map(|def| {
                let mut objective = ObjectiveInstance::from_definition(def);
                objective.activate();
                objective
            })
            .collect();
        Self {
            definition: Arc::clone(definition),
            objectives,
        }
    }

    pub fn definition(&self) -> &Arc<QuestDefinition> {
        &self.definition
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn objectives(&self) -> &[ObjectiveInstance] {
        &self.objectives
    }

    pub fn all_objectives_completed(&self) -> bool {
        self.objectives.iter().all(ObjectiveInstance::is_completed)
    }

    /// Mean objective completion; 0.0 when there are no objectives
    pub fn progress(&self) -> f32 {
        if self.objectives.is_empty() {
            return 0.0;
        }
        let total: f32 = self.objectives.iter().map(ObjectiveInstance::progress_fraction).sum();
        total / self.objectives.len() as f32
    }
}

pub struct QuestTracker {
    owner: String,
    active: Vec<ActiveQuest>,
    completed: BTreeSet<String>,
    failed: BTreeSet<String>,
    hooks: Box<dyn QuestHooks>,
    listeners: Listeners<QuestEvent>,
}

impl QuestTracker {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            active: Vec::new(),
            completed: BTreeSet::new(),
            failed: BTreeSet::new(),
            hooks: Box::new(NoQuestHooks),
            listeners: Listeners::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: Box<dyn QuestHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&QuestEvent) + 'static) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Start a quest. Refused if it is already active or already completed.
    /// A previously failed quest may be restarted.
    pub fn start_quest(&mut self, definition: &Arc<QuestDefinition>) -> bool {
        if self.is_quest_active(&definition.id) {
            warn!(target: "gameplay::quest", "start_quest: '{}' already active for {}", definition.id, self.owner);
            return false;
        }
        if self.completed.contains(&definition.id) {
            warn!(target: "gameplay::quest", "start_quest: '{}' already completed by {}", definition.id, self.owner);
            return false;
        }

        if self.failed.remove(&definition.id) {
            debug!(target: "gameplay::quest", "Restarting failed quest '{}'", definition.id);
        }
        self.active.push(ActiveQuest::start(definition));

        info!(target: "gameplay::quest", "{} started quest '{}'", self.owner, definition.id);
        self.listeners.emit(&QuestEvent::QuestStarted {
            owner: self.owner.clone(),
            quest_id: definition.id.clone(),
        });
        true
    }

    /// Start by quest id. Unknown ids are refused without mutation.
    pub fn start_quest_by_id(&mut self, repository: &DefinitionRepository, quest_id: &str) -> bool {
        match repository.quest(quest_id) {
            Some(definition) => {
                let definition = Arc::clone(definition);
                self.start_quest(&definition)
            }
            None => {
                warn!(target: "gameplay::quest", "start_quest: unknown quest '{}'", quest_id);
                false
            }
        }
    }

    /// Add progress to one objective of an active quest.
    /// Auto-completes the quest when its policy allows and every objective is done.
    pub fn update_objective_progress(&mut self, quest: &QuestDefinition, objective_id: &str, delta: i32) {
        if delta <= 0 {
            warn!(target: "gameplay::quest", "update_objective_progress: non-positive delta {} for '{}'", delta, quest.id);
            return;
        }
        let Some(quest_index) = self.position(&quest.id) else {
            debug!(target: "gameplay::quest", "update_objective_progress: '{}' is not active", quest.id);
            return;
        };

        let entry = &mut self.active[quest_index];
        let Some(index) = entry.objectives.iter().position(|o| o.id() == objective_id) else {
            warn!(
                target: "gameplay::quest",
                "update_objective_progress: '{}' has no objective '{}'", quest.id, objective_id
            );
            return;
        };

        let objective = &mut entry.objectives[index];
        let just_completed = objective.add_progress(delta);
        let (current, required) = (objective.current(), objective.required());
        let definition = Arc::clone(&entry.definition);

        debug!(
            target: "gameplay::quest",
            "'{}' objective '{}' at {}/{}", quest.id, objective_id, current, required
        );
        self.listeners.emit(&QuestEvent::ObjectiveProgress {
            owner: self.owner.clone(),
            quest_id: quest.id.clone(),
            objective_id: objective_id.to_string(),
            current,
            required,
        });

        if !just_completed {
            return;
        }

        self.hooks.objective_completed(&definition, index);
        self.listeners.emit(&QuestEvent::ObjectiveCompleted {
            owner: self.owner.clone(),
            quest_id: quest.id.clone(),
            objective_id: objective_id.to_string(),
            index,
        });

        self.check_completion(quest_index);
    }

    /// Complete an active quest regardless of its objectives
    pub fn complete_quest(&mut self, quest: &QuestDefinition) -> bool {
        let Some(index) = self.position(&quest.id) else {
            warn!(target: "gameplay::quest", "complete_quest: '{}' is not active for {}", quest.id, self.owner);
            return false;
        };
        self.finish(index);
        true
    }

    /// Fail an active quest. Objectives that are not yet complete become Failed.
    pub fn fail_quest(&mut self, quest: &QuestDefinition) -> bool {
        let Some(index) = self.position(&quest.id) else {
            debug!(target: "gameplay::quest", "fail_quest: '{}' is not active", quest.id);
            return false;
        };

        let mut entry = self.active.remove(index);
        for objective in &mut entry.objectives {
            objective.fail();
        }
        self.failed.insert(quest.id.clone());

        info!(target: "gameplay::quest", "{} failed quest '{}'", self.owner, quest.id);
        self.listeners.emit(&QuestEvent::QuestFailed {
            owner: self.owner.clone(),
            quest_id: quest.id.clone(),
        });
        true
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_quest_active(&self, quest_id: &str) -> bool {
        self.position(quest_id).is_some()
    }

    pub fn is_quest_completed(&self, quest_id: &str) -> bool {
        self.completed.contains(quest_id)
    }

    pub fn is_quest_failed(&self, quest_id: &str) -> bool {
        self.failed.contains(quest_id)
    }

    /// Overall progress in [0, 1]. Inactive quests report 1.0 if completed, else 0.0.
    pub fn quest_progress(&self, quest_id: &str) -> f32 {
        match self.get(quest_id) {
            Some(entry) => entry.progress(),
            None if self.completed.contains(quest_id) => 1.0,
            None => 0.0,
        }
    }

    pub fn get(&self, quest_id: &str) -> Option<&ActiveQuest> {
        self.active.iter().find(|q| q.id() == quest_id)
    }

    /// Objective instances of an active quest (empty when not active)
    pub fn objectives(&self, quest_id: &str) -> &[ObjectiveInstance] {
        self.get(quest_id).map(ActiveQuest::objectives).unwrap_or(&[])
    }

    pub fn active_quests(&self) -> &[ActiveQuest] {
        &self.active
    }

    pub fn active_quest_ids(&self) -> Vec<&str> {
        self.active.iter().map(ActiveQuest::id).collect()
    }

    pub fn completed_quest_ids(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn failed_quest_ids(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> QuestSnapshot {
        QuestSnapshot {
            active: self
                .active
                .iter()
                .map(|entry| ActiveQuestRecord {
                    quest_id: entry.id().to_string(),
                    objectives: entry
                        .objectives
                        .iter()
                        .map(|o| ObjectiveRecord {
                            objective_id: o.id().to_string(),
                            current: o.current(),
                            state: o.state(),
                        })
                        .collect(),
                })
                .collect(),
            completed: self.completed.iter().cloned().collect(),
            failed: self.failed.iter().cloned().collect(),
        }
    }

    /// Replace all quest state with a snapshot. No events are emitted.
    pub fn restore(&mut self, snapshot: &QuestSnapshot, repository: &DefinitionRepository) {
        self.active.clear();
        self.completed = snapshot.completed.iter().cloned().collect();
        self.failed = snapshot
            .failed
            .iter()
            .filter(|id| !self.completed.contains(*id))
            .cloned()
            .collect();

        for record in &snapshot.active {
            if self.completed.contains(&record.quest_id) || self.failed.contains(&record.quest_id) {
                warn!(target: "gameplay::quest", "restore: '{}' is both active and finished, skipping", record.quest_id);
                continue;
            }
            if self.is_quest_active(&record.quest_id) {
                continue;
            }
            let Some(definition) = repository.quest(&record.quest_id) else {
                warn!(target: "gameplay::quest", "restore: unknown quest '{}', skipping", record.quest_id);
                continue;
            };

            let mut entry = ActiveQuest::start(definition);
            for saved in &record.objectives {
                match entry.objectives.iter_mut().find(|o| o.id() == saved.objective_id) {
                    Some(objective) => objective.restore(saved.current, saved.state),
                    None => warn!(
                        target: "gameplay::quest",
                        "restore: '{}' has no objective '{}'", record.quest_id, saved.objective_id
                    ),
                }
            }
            self.active.push(entry);
        }

        info!(
            target: "gameplay::quest",
            "Restored {} active, {} completed, {} failed quests for {}",
            self.active.len(), self.completed.len(), self.failed.len(), self.owner
        );
    }

    // ------------------------------------------------------------------

    fn position(&self, quest_id: &str) -> Option<usize> {
        self.active.iter().position(|q| q.id() == quest_id)
    }

    fn check_completion(&mut self, index: usize) {
        let entry = &self.active[index];
        if entry.definition.completion == CompletionPolicy::RequireAll && entry.all_objectives_completed() {
            self.finish(index);
        }
    }

    fn finish(&mut self, index: usize) {
        let entry = self.active.remove(index);
        let quest_id = entry.id().to_string();
        self.completed.insert(quest_id.clone());

        info!(target: "gameplay::quest", "{} completed quest '{}'", self.owner, quest_id);
        self.listeners.emit(&QuestEvent::QuestCompleted {
            owner: self.owner.clone(),
            quest_id,
        });
    }
}

impl fmt::Debug for QuestTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestTracker")
            .field("owner", &self.owner)
            .field("active", &self.active_quest_ids())
            .field("completed", &self.completed)
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::ObjectiveDefinition;
    use crate::quest::objective::ObjectiveState;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn three_step() -> Arc<QuestDefinition> {
        Arc::new(
            QuestDefinition::new("supplies")
                .with_objective(ObjectiveDefinition::new("wood", 1))
                .with_objective(ObjectiveDefinition::new("stone", 1))
                .with_objective(ObjectiveDefinition::new("rope", 1)),
        )
    }

    fn recorder(tracker: &mut QuestTracker) -> Rc<RefCell<Vec<QuestEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        tracker.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    fn count(events: &Rc<RefCell<Vec<QuestEvent>>>, event_type: &str) -> usize {
        events.borrow().iter().filter(|e| e.event_type() == event_type).count()
    }

    struct CompletedIndices(Rc<RefCell<Vec<usize>>>);

    impl QuestHooks for CompletedIndices {
        fn objective_completed(&mut self, _quest: &QuestDefinition, index: usize) {
            self.0.borrow_mut().push(index);
        }
    }

    #[test]
    fn test_three_objectives_complete_once() {
        let quest = three_step();
        let indices = Rc::new(RefCell::new(Vec::new()));
        let mut tracker = QuestTracker::new("hero").with_hooks(Box::new(CompletedIndices(Rc::clone(&indices))));
        let events = recorder(&mut tracker);

        assert!(tracker.start_quest(&quest));
        assert_eq!(tracker.quest_progress("supplies"), 0.0);

        tracker.update_objective_progress(&quest, "wood", 1);
        tracker.update_objective_progress(&quest, "stone", 1);
        assert!((tracker.quest_progress("supplies") - 2.0 / 3.0).abs() < 1e-6);
        assert!(tracker.is_quest_active("supplies"));

        tracker.update_objective_progress(&quest, "rope", 1);
        assert!(!tracker.is_quest_active("supplies"));
        assert!(tracker.is_quest_completed("supplies"));
        assert_eq!(tracker.quest_progress("supplies"), 1.0);
        assert_eq!(count(&events, "quest_completed"), 1);
        assert_eq!(count(&events, "objective_completed"), 3);
        assert_eq!(*indices.borrow(), vec![0, 1, 2]);
        assert_eq!(tracker.completed_quest_ids().collect::<Vec<_>>(), vec!["supplies"]);

        // Further progress on a finished quest does nothing
        tracker.update_objective_progress(&quest, "rope", 1);
        assert_eq!(count(&events, "quest_completed"), 1);
        assert!(!tracker.start_quest(&quest));
    }

    #[test]
    fn test_event_order_on_final_objective() {
        let quest = Arc::new(QuestDefinition::new("talk").with_objective(ObjectiveDefinition::new("elder", 1)));
        let mut tracker = QuestTracker::new("hero");
        tracker.start_quest(&quest);
        let events = recorder(&mut tracker);

        tracker.update_objective_progress(&quest, "elder", 1);
        let types: Vec<_> = events.borrow().iter().map(|e| e.event_type()).collect();
        assert_eq!(types, vec!["objective_progress", "objective_completed", "quest_completed"]);
    }

    #[test]
    fn test_progress_is_ignored_when_invalid() {
        let quest = three_step();
        let mut tracker = QuestTracker::new("hero");
        let events = recorder(&mut tracker);

        tracker.update_objective_progress(&quest, "wood", 1);
        assert!(events.borrow().is_empty(), "quest not active");

        tracker.start_quest(&quest);
        tracker.update_objective_progress(&quest, "gold", 1);
        tracker.update_objective_progress(&quest, "wood", 0);
        tracker.update_objective_progress(&quest, "wood", -2);
        assert_eq!(count(&events, "objective_progress"), 0);
        assert_eq!(tracker.objectives("supplies")[0].current(), 0);
    }

    #[test]
    fn test_fail_quest() {
        let quest = three_step();
        let mut tracker = QuestTracker::new("hero");
        tracker.start_quest(&quest);
        tracker.update_objective_progress(&quest, "wood", 1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        tracker.subscribe(move |event| {
            if let QuestEvent::QuestFailed { .. } = event {
                sink.borrow_mut().push(event.quest_id().to_string());
            }
        });

        assert!(tracker.fail_quest(&quest));
        assert!(tracker.is_quest_failed("supplies"));
        assert!(!tracker.is_quest_completed("supplies"));
        assert!(!tracker.is_quest_active("supplies"));
        assert_eq!(tracker.failed_quest_ids().collect::<Vec<_>>(), vec!["supplies"]);
        assert_eq!(tracker.completed_quest_ids().count(), 0);
        assert_eq!(tracker.quest_progress("supplies"), 0.0);
        assert_eq!(*seen.borrow(), vec!["supplies".to_string()]);
        assert!(!tracker.fail_quest(&quest));
    }

    #[test]
    fn test_fail_marks_unfinished_objectives() {
        let quest = three_step();
        let mut entry = ActiveQuest::start(&quest);
        entry.objectives[0].add_progress(1);
        for objective in &mut entry.objectives {
            objective.fail();
        }
        let states: Vec<_> = entry.objectives().iter().map(ObjectiveInstance::state).collect();
        assert_eq!(
            states,
            vec![ObjectiveState::Completed, ObjectiveState::Failed, ObjectiveState::Failed]
        );
    }

    #[test]
    fn test_restart_after_fail() {
        let quest = three_step();
        let mut tracker = QuestTracker::new("hero");
        tracker.start_quest(&quest);
        tracker.fail_quest(&quest);

        assert!(tracker.start_quest(&quest));
        assert!(!tracker.is_quest_failed("supplies"));
        assert!(tracker.is_quest_active("supplies"));
        assert!(!tracker.start_quest(&quest), "already active");
    }

    #[test]
    fn test_manual_only_waits_for_complete() {
        let quest = Arc::new(
            QuestDefinition::new("escort")
                .with_objective(ObjectiveDefinition::new("arrive", 1))
                .with_completion(CompletionPolicy::ManualOnly),
        );
        let mut tracker = QuestTracker::new("hero");
        tracker.start_quest(&quest);
        tracker.update_objective_progress(&quest, "arrive", 1);

        assert!(tracker.is_quest_active("escort"));
        assert_eq!(tracker.quest_progress("escort"), 1.0);
        assert!(tracker.complete_quest(&quest));
        assert!(tracker.is_quest_completed("escort"));
        assert!(!tracker.complete_quest(&quest));
    }

    #[test]
    fn test_empty_quest_progress_is_zero() {
        let quest = Arc::new(QuestDefinition::new("empty"));
        let mut tracker = QuestTracker::new("hero");
        tracker.start_quest(&quest);
        assert_eq!(tracker.quest_progress("empty"), 0.0);
        assert_eq!(tracker.quest_progress("missing"), 0.0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut repository = DefinitionRepository::new();
        let quest = repository.insert_quest(
            QuestDefinition::new("hunt").with_objective(ObjectiveDefinition::new("boars", 4)),
        );
        let done = repository.insert_quest(
            QuestDefinition::new("intro").with_objective(ObjectiveDefinition::new("wake", 1)),
        );

        let mut tracker = QuestTracker::new("hero");
        tracker.start_quest(&done);
        tracker.update_objective_progress(&done, "wake", 1);
        tracker.start_quest(&quest);
        tracker.update_objective_progress(&quest, "boars", 3);

        let mut restored = QuestTracker::new("hero");
        restored.restore(&tracker.snapshot(), &repository);

        assert!(restored.is_quest_completed("intro"));
        assert_eq!(restored.active_quest_ids(), vec!["hunt"]);
        assert_eq!(restored.objectives("hunt")[0].current(), 3);
        assert_eq!(restored.objectives("hunt")[0].state(), ObjectiveState::Active);

        restored.update_objective_progress(&quest, "boars", 1);
        assert!(restored.is_quest_completed("hunt"));
    }
}
