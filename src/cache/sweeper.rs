//! Periodic purge of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::store::TagAwareStore;

/// Purge expired entries once. Returns the number purged.
pub fn sweep_once(store: &dyn TagAwareStore) -> usize {
    let purged = store.purge_expired(OffsetDateTime::now_utc());
    if purged > 0 {
        debug!(purged, remaining = store.len(), "Purged expired cache entries");
    }
    purged
}

/// Spawn a task purging expired entries every `interval`.
pub fn spawn_sweeper(store: Arc<dyn TagAwareStore>, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting cache sweeper");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(store.as_ref());
        }
    })
}
