//! Expiration Sweeper
//!
//! Background task that periodically deletes expired tiles, independent of
//! request traffic.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Runs one sweep pass against the store's clock.
///
/// Returns the number of entries removed.
pub async fn sweep_once(store: &CacheStore) -> usize {
    let removed = store.sweep().await;

    if removed > 0 {
        info!("Sweep: removed {} expired entries", removed);
    } else {
        debug!("Sweep: no expired entries found");
    }

    removed
}

/// Spawns a background task that sweeps the store every `interval`.
///
/// The store lock is only held for each scan-and-delete step, so lookups and
/// writes proceed between passes. Returns `None` when `interval` is zero.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(store.clone(), Duration::from_secs(3600));
/// // Later, during shutdown:
/// if let Some(handle) = handle { handle.abort(); }
/// ```
pub fn spawn_sweep_task(store: CacheStore, interval: Duration) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Periodic sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        info!("Starting sweep task with interval of {:?}", interval);

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            sweep_once(&store).await;
        }
    }))
}
