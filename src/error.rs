use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating authored definitions
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid definition '{id}': {reason}")]
    Invalid { id: String, reason: String },
    #[error("duplicate {kind} definition '{id}'")]
    Duplicate { kind: &'static str, id: String },
}

impl DataError {
    pub fn invalid(id: &str, reason: impl Into<String>) -> Self {
        DataError::Invalid {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by save stores and save blobs
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("save encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("save version {found} is newer than supported version {supported}")]
    VersionMismatch { found: u32, supported: u32 },
    #[error("save slot not found: {0}")]
    SlotNotFound(String),
    #[error("invalid save slot name: {0:?}")]
    InvalidSlot(String),
}

/// Errors raised while reading the runtime configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
