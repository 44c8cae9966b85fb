//! Diplomacy engine daemon for Entente.
//!
//! Owns the diplomacy state for a running game: it loads and reconciles the
//! persisted relations and sanctions, keeps them trimmed with a background
//! sweeper, and streams every diplomatic event to the log until stopped.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `entente-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Open the nation store under the data directory
//! 4. Build the diplomacy service with persistence and the event stream
//! 5. Load, import, bootstrap, and reconcile persisted state
//! 6. Start the expiration sweeper
//! 7. Wait for Ctrl-C, then stop the sweeper and drain the event stream

mod error;
mod events;

use std::path::Path;
use std::sync::Arc;

use entente_core::config::{LogFormat, LoggingConfig};
use entente_core::{DiplomacyService, DiplomacySettings, EntenteConfig, SystemClock, spawn_sweeper};
use entente_store::{DiplomacyFiles, JsonNationRepository};
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;
use crate::events::{ChannelObserver, spawn_event_logger};

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "entente-config.yaml";

/// Application entry point for the diplomacy server.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the nation store
/// cannot be opened, or a background task fails.
#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // 1. Load configuration.
    let config = EntenteConfig::load_or_default(Path::new(CONFIG_PATH))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("entente-server starting");
    info!(
        data_dir = %config.storage.data_dir.display(),
        war_cost = %config.diplomacy.war_cost,
        war_cooldown_hours = config.diplomacy.war_cooldown_hours,
        war_duration_hours = config.diplomacy.war_duration_hours,
        advanced_war = config.diplomacy.advanced_war,
        sweep_interval_secs = config.sweeper.interval_secs,
        "Configuration loaded"
    );

    // 3. Open the nation store.
    let nations = JsonNationRepository::open(config.storage.nations_dir())?;
    info!(dir = %nations.dir().display(), "Nation store opened");

    // 4. Build the service.
    let (observer, event_rx) = ChannelObserver::channel();
    let event_logger = spawn_event_logger(event_rx);
    let service = Arc::new(
        DiplomacyService::new(
            Arc::new(nations),
            Arc::new(SystemClock),
            DiplomacySettings::from(&config.diplomacy),
        )
        .with_files(DiplomacyFiles::new(&config.storage.data_dir))
        .with_observer(Arc::new(observer)),
    );

    // 5. Load and reconcile persisted state.
    let report = service.startup();
    info!(
        expired_relations = report.expired.relations_expired,
        expired_sanctions = report.expired.sanctions_expired,
        "Startup reconciliation complete"
    );

    // 6. Start the sweeper.
    let (stop_tx, stop_rx) = watch::channel(false);
    let sweeper = spawn_sweeper(Arc::clone(&service), config.sweeper.interval(), stop_rx);

    // 7. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .map_err(|source| ServerError::Signal { source })?;
    info!("Shutdown requested");

    if stop_tx.send(true).is_err() {
        debug!("Sweeper already stopped");
    }
    sweeper.await?;

    // The service holds the last event sender.
    drop(service);
    event_logger.await?;

    info!("entente-server shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
