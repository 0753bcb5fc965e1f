//! Definition Data
//!
//! Authored ability, item and quest definitions loaded from TOML.

pub mod repository;

pub use repository::{DefinitionRepository, DEFAULT_BEHAVIOR};
