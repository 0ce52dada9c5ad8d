//! Expiry Sweep Task
//!
//! Reads already treat expired entries as absent; the sweep only reclaims
//! memory held by keys nobody reads again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a task that purges expired entries from `store` every `period`.
///
/// Returns the task handle so shutdown can abort it.
pub fn spawn_cleanup_task(store: MemoryStore, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "Starting expiry sweep task");

        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let removed = store.cleanup_expired().await;
            if removed > 0 {
                info!(removed, "Expiry sweep removed entries");
            } else {
                debug!("Expiry sweep found nothing to remove");
            }
        }
    })
}
