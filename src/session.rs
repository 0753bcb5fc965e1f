//! Scripted gameplay session
//!
//! Drives one owner on a fixed tick: time advances on a [`ManualScheduler`],
//! expired timers are routed back, abilities are fired whenever ready, quest
//! objectives tick forward, and auto-saves land in a [`SaveStore`].

use std::future::Future;

use tracing::{debug, info, warn};

use crate::config::GameplayConfig;
use crate::data::DefinitionRepository;
use crate::error::SaveError;
use crate::owner::GameplayOwner;
use crate::save::{AutoSave, SaveStore};
use crate::timer::{Clock, ManualScheduler};

/// Ticks between scripted quest progress steps (1 s at 20 Hz)
const QUEST_STEP_TICKS: u64 = 20;
/// Ticks between uses of consumable items
const USE_ITEM_TICKS: u64 = 40;

pub struct Session<S: SaveStore> {
    config: GameplayConfig,
    repository: DefinitionRepository,
    owner: GameplayOwner,
    scheduler: ManualScheduler,
    autosave: AutoSave,
    store: S,
    ticks: u64,
    saves: usize,
}

impl<S: SaveStore> Session<S> {
    pub fn new(config: GameplayConfig, repository: DefinitionRepository, store: S, owner_id: &str) -> Self {
        let mut owner = GameplayOwner::new(owner_id, config.inventory_slots);
        owner.abilities.subscribe(|event| debug!("{} {}", event.event_type(), event.ability_id()));
        owner.inventory.subscribe(|event| debug!("{}", event.event_type()));
        owner.quests.subscribe(|event| info!("{} {}", event.event_type(), event.quest_id()));

        let autosave = AutoSave::new(config.autosave_slot.clone(), config.autosave_interval_ms());
        Self {
            config,
            repository,
            owner,
            scheduler: ManualScheduler::new(),
            autosave,
            store,
            ticks: 0,
            saves: 0,
        }
    }

    pub fn owner(&self) -> &GameplayOwner {
        &self.owner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of saves written so far
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Resume from the auto-save slot if one exists, otherwise grant everything fresh
    pub fn start(&mut self) -> Result<(), SaveError> {
        let slot = self.config.autosave_slot.clone();
        if self.store.exists(&slot) {
            let data = self.store.load(&slot)?;
            self.owner.restore(&data, &self.repository, &mut self.scheduler);
        } else {
            self.grant_everything();
        }

        self.autosave.set_enabled(true, &mut self.scheduler);
        Ok(())
    }

    fn grant_everything(&mut self) {
        for id in self.repository.ability_ids() {
            self.owner.abilities.grant_by_id(&self.repository, id);
        }
        for id in self.repository.item_ids() {
            if let Some(item) = self.repository.item(id) {
                self.owner.inventory.add_item(item, item.max_stack_size);
            }
        }
        for id in self.repository.quest_ids() {
            self.owner.quests.start_quest_by_id(&self.repository, id);
        }
    }

    /// Advance one tick
    pub fn tick(&mut self) -> Result<(), SaveError> {
        self.ticks += 1;

        let mut autosave_due = false;
        for handle in self.scheduler.advance(self.config.tick_ms) {
            if self.autosave.on_timer(handle, &mut self.scheduler) {
                autosave_due = true;
            } else if !self.owner.handle_timer(handle, &mut self.scheduler) {
                debug!("Ignoring stale timer {:?}", handle);
            }
        }

        self.fire_ready_abilities();
        if self.ticks % QUEST_STEP_TICKS == 0 {
            self.step_quests();
        }
        if self.ticks % USE_ITEM_TICKS == 0 {
            self.use_consumable();
        }

        if autosave_due {
            let slot = self.autosave.slot().to_string();
            self.save(&slot)?;
        }
        Ok(())
    }

    /// Capture the owner and write it to `slot`
    pub fn save(&mut self, slot: &str) -> Result<(), SaveError> {
        let data = self
            .owner
            .capture(slot, &self.scheduler)
            .with_play_time(self.scheduler.now_ms() as f64 / 1000.0);
        self.store.save(slot, &data)?;
        self.saves += 1;
        Ok(())
    }

    fn fire_ready_abilities(&mut self) {
        for id in self.repository.ability_ids() {
            if !self.owner.abilities.can_activate(id) {
                continue;
            }
            if let Some(definition) = self.repository.ability(id) {
                self.owner.abilities.try_activate(definition, &mut self.scheduler);
            }
        }
    }

    /// One point of progress on the first unfinished objective of each active quest
    fn step_quests(&mut self) {
        let active: Vec<_> = self
            .owner
            .quests
            .active_quests()
            .iter()
            .filter_map(|quest| {
                let objective = quest.objectives().iter().find(|o| !o.is_completed())?;
                Some((quest.definition().clone(), objective.id().to_string()))
            })
            .collect();

        for (quest, objective_id) in active {
            self.owner.quests.update_objective_progress(&quest, &objective_id, 1);
        }
    }

    fn use_consumable(&mut self) {
        let usable = self
            .owner
            .inventory
            .stacks()
            .iter()
            .find(|stack| stack.definition().usable)
            .map(|stack| stack.definition().clone());

        if let Some(item) = usable {
            self.owner.inventory.use_item(&item);
        }
    }
}

/// Run `session` on a real-time tick loop until `run_ticks` ticks pass
/// (0 = no limit) or `shutdown` resolves. A final save is written on exit.
pub async fn run_session<S: SaveStore>(
    session: &mut Session<S>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), SaveError> {
    let run_ticks = session.config.run_ticks;
    let mut interval = tokio::time::interval(session.config.tick_interval());
    tokio::pin!(shutdown);

    info!(
        "Session for {} running at {} ms/tick",
        session.owner.id(),
        session.config.tick_ms
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = session.tick() {
                    warn!("Tick {} failed: {}", session.ticks, e);
                }
                if run_ticks > 0 && session.ticks >= run_ticks {
                    break;
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    let slot = session.autosave.slot().to_string();
    session.save(&slot)?;
    info!(
        "Session ended after {} ticks ({} s game time), {} saves",
        session.ticks,
        session.scheduler.now_ms() / 1000,
        session.saves
    );
    Ok(())
}
