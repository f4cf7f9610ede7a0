//! Snapshot Task
//!
//! Background task that periodically writes the cache's dump to disk.
//! Staleness is never swept here; the cache handles it lazily on reads.

use std::path::PathBuf;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::SharedCache;
use crate::snapshot;

/// Spawns a background task that saves a snapshot every `interval_secs`.
///
/// A failed save is logged and retried on the next tick.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be aborted during shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_snapshot_task(state.cache.clone(), "cache.json".into(), 30);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_snapshot_task(
    cache: SharedCache,
    path: PathBuf,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting snapshot task with interval of {} seconds, writing to {}",
            interval.as_secs(),
            path.display()
        );

        loop {
            tokio::time::sleep(interval).await;

            match snapshot::save(&cache, &path).await {
                Ok(records) => debug!("Snapshot: saved {} entries", records),
                Err(e) => warn!("Snapshot failed: {}", e),
            }
        }
    })
}
