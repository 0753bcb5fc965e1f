use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gameplay_systems::session::{run_session, Session};
use gameplay_systems::{DefinitionRepository, FileSaveStore, GameplayConfig};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gameplay_systems=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gameplay.toml"));

    let config = match GameplayConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let mut repository = DefinitionRepository::new();
    if let Err(e) = repository.load_from_directory(&config.data_dir) {
        error!("Failed to load definitions from {:?}: {}", config.data_dir, e);
        std::process::exit(1);
    }

    let store = FileSaveStore::new(config.save_dir.clone());
    let mut session = Session::new(config, repository, store, "player");
    if let Err(e) = session.start() {
        error!("Failed to start session: {}", e);
        std::process::exit(1);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match run_session(&mut session, shutdown).await {
        Ok(()) => info!("Saved to {:?}", session.store().save_dir()),
        Err(e) => {
            error!("Final save failed: {}", e);
            std::process::exit(1);
        }
    }
}
