use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::ability::{AbilityBehavior, AbilityDefinition, ChanneledBehavior, InstantBehavior, RawAbilityDefinition};
use crate::error::DataError;
use crate::inventory::{ItemDefinition, RawItemDefinition};
use crate::quest::{QuestDefinition, RawQuestFile};

/// Behavior used when a definition names none
pub const DEFAULT_BEHAVIOR: &str = "instant";

/// Read-only store of every authored definition, shared by all owners
#[derive(Debug)]
pub struct DefinitionRepository {
    abilities: HashMap<String, Arc<AbilityDefinition>>,
    items: HashMap<String, Arc<ItemDefinition>>,
    quests: HashMap<String, Arc<QuestDefinition>>,
    behaviors: HashMap<String, Arc<dyn AbilityBehavior>>,
}

impl DefinitionRepository {
    pub fn new() -> Self {
        let mut repository = Self {
            abilities: HashMap::new(),
            items: HashMap::new(),
            quests: HashMap::new(),
            behaviors: HashMap::new(),
        };
        repository.register_behavior(DEFAULT_BEHAVIOR, Arc::new(InstantBehavior));
        repository.register_behavior("channeled", Arc::new(ChanneledBehavior));
        repository
    }

    /// Make an ability behavior available to definitions by name
    pub fn register_behavior(&mut self, name: &str, behavior: Arc<dyn AbilityBehavior>) {
        self.behaviors.insert(name.to_string(), behavior);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load abilities, items and quests from `data_dir`.
    /// Missing subdirectories are skipped with a warning.
    pub fn load_from_directory(&mut self, data_dir: &Path) -> Result<(), DataError> {
        self.load_abilities(&data_dir.join("abilities"))?;
        self.load_items(&data_dir.join("items"))?;
        self.load_quests(&data_dir.join("quests"))?;
        Ok(())
    }

    fn load_abilities(&mut self, dir: &Path) -> Result<(), DataError> {
        for path in toml_files(dir, false)? {
            let table: HashMap<String, RawAbilityDefinition> = read_toml(&path)?;
            for (id, raw) in sorted(table) {
                if self.abilities.contains_key(&id) {
                    return Err(DataError::Duplicate { kind: "ability", id });
                }
                let behavior = self.resolve_behavior(&id, raw.behavior.as_deref());
                let ability = AbilityDefinition::from_raw(&id, &raw, behavior)?;
                debug!("Loaded ability: {} ({})", ability.display_name, id);
                self.abilities.insert(id, Arc::new(ability));
            }
        }

        info!("Loaded {} ability definitions", self.abilities.len());
        Ok(())
    }

    fn load_items(&mut self, dir: &Path) -> Result<(), DataError> {
        for path in toml_files(dir, false)? {
            // Parse as table of items
            let table: HashMap<String, RawItemDefinition> = read_toml(&path)?;
            for (id, raw) in sorted(table) {
                if self.items.contains_key(&id) {
                    return Err(DataError::Duplicate { kind: "item", id });
                }
                let item = ItemDefinition::from_raw(&id, &raw)?;
                self.items.insert(id, Arc::new(item));
            }
        }

        info!("Loaded {} item definitions", self.items.len());
        Ok(())
    }

    /// One quest per file, searched recursively. Bad files are skipped.
    fn load_quests(&mut self, dir: &Path) -> Result<(), DataError> {
        let mut count = 0;
        for path in toml_files(dir, true)? {
            match self.load_quest_file(&path) {
                Ok(()) => count += 1,
                Err(e) => warn!("Failed to load quest {:?}: {}", path, e),
            }
        }

        info!("Loaded {} quest definitions", count);
        Ok(())
    }

    fn load_quest_file(&mut self, path: &Path) -> Result<(), DataError> {
        let raw: RawQuestFile = read_toml(path)?;
        let quest = QuestDefinition::from_raw(&raw.quest)?;
        if self.quests.contains_key(&quest.id) {
            return Err(DataError::Duplicate { kind: "quest", id: quest.id });
        }

        debug!("Loaded quest: {} ({})", quest.title, quest.id);
        self.quests.insert(quest.id.clone(), Arc::new(quest));
        Ok(())
    }

    fn resolve_behavior(&self, ability_id: &str, name: Option<&str>) -> Arc<dyn AbilityBehavior> {
        let name = name.unwrap_or(DEFAULT_BEHAVIOR);
        if let Some(behavior) = self.behaviors.get(name) {
            return Arc::clone(behavior);
        }

        warn!("Ability '{}' uses unknown behavior '{}', falling back to '{}'", ability_id, name, DEFAULT_BEHAVIOR);
        Arc::new(InstantBehavior)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add or replace an ability definition
    pub fn insert_ability(&mut self, ability: AbilityDefinition) -> Arc<AbilityDefinition> {
        let ability = Arc::new(ability);
        self.abilities.insert(ability.id.clone(), Arc::clone(&ability));
        ability
    }

    /// Add or replace an item definition
    pub fn insert_item(&mut self, item: ItemDefinition) -> Arc<ItemDefinition> {
        let item = Arc::new(item);
        self.items.insert(item.id.clone(), Arc::clone(&item));
        item
    }

    /// Add or replace a quest definition
    pub fn insert_quest(&mut self, quest: QuestDefinition) -> Arc<QuestDefinition> {
        let quest = Arc::new(quest);
        self.quests.insert(quest.id.clone(), Arc::clone(&quest));
        quest
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn ability(&self, id: &str) -> Option<&Arc<AbilityDefinition>> {
        self.abilities.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&Arc<ItemDefinition>> {
        self.items.get(id)
    }

    pub fn quest(&self, id: &str) -> Option<&Arc<QuestDefinition>> {
        self.quests.get(id)
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn quest_count(&self) -> usize {
        self.quests.len()
    }

    /// Get all ability IDs, sorted
    pub fn ability_ids(&self) -> Vec<&str> {
        sorted_keys(&self.abilities)
    }

    /// Get all item IDs, sorted
    pub fn item_ids(&self) -> Vec<&str> {
        sorted_keys(&self.items)
    }

    /// Get all quest IDs, sorted
    pub fn quest_ids(&self) -> Vec<&str> {
        sorted_keys(&self.quests)
    }
}

impl Default for DefinitionRepository {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// File helpers
// ============================================================================

/// Every `.toml` file in `dir` in path order; empty if the directory is missing
fn toml_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, DataError> {
    if !dir.exists() {
        warn!("Definition directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    collect_toml_files(dir, recursive, &mut paths)?;
    paths.sort();
    Ok(paths)
}

fn collect_toml_files(dir: &Path, recursive: bool, paths: &mut Vec<PathBuf>) -> Result<(), DataError> {
    let io_error = |source: std::io::Error| DataError::Io { path: dir.to_path_buf(), source };
    let entries = std::fs::read_dir(dir).map_err(io_error)?;

    for entry in entries {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            if recursive {
                collect_toml_files(&path, recursive, paths)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }

    Ok(())
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| DataError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn sorted_keys<T>(table: &HashMap<String, T>) -> Vec<&str> {
    let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

fn sorted<T>(table: HashMap<String, T>) -> Vec<(String, T)> {
    let mut entries: Vec<_> = table.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}
