//! Periodic expiration sweeper.
//!
//! Lapsed relations and sanctions are already evicted lazily by reads, so
//! the sweeper only bounds how long a lapsed record can sit in the stores
//! (and on disk) when nobody asks about it.
//!
//! ```ignore
//! let (stop, stopped) = tokio::sync::watch::channel(false);
//! let handle = spawn_sweeper(Arc::clone(&service), config.sweeper.interval(), stopped);
//! // ...
//! stop.send(true)?;
//! handle.await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::service::DiplomacyService;

/// Spawn a task that calls [`DiplomacyService::sweep`] every `period`.
///
/// The first sweep runs one full `period` after spawning. The task ends
/// when `shutdown` turns `true` or its sender is dropped.
pub fn spawn_sweeper(
    service: Arc<DiplomacyService>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(period_secs = period.as_secs(), "Expiration sweeper started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = service.sweep();
                    if !report.is_empty() {
                        debug!(
                            relations = report.relations_expired,
                            sanctions = report.sanctions_expired,
                            "Sweeper pass removed records"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Expiration sweeper stopped");
    })
}
