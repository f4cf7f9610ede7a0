//! Snapshot Module
//!
//! Persists the cache's dump as a JSON file and loads it back. The cache has
//! no persistence of its own; this is the server's side of that contract.

use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::api::SharedCache;
use crate::cache::DumpRecord;
use crate::error::Result;

/// Record type written to snapshot files.
pub type SnapshotRecord = DumpRecord<String, String>;

// == Save ==
/// Writes the cache's current dump to `path`.
///
/// The file is written next to `path` first and renamed into place, so a
/// crash mid-write leaves the previous snapshot intact. Returns the number of
/// records written.
pub async fn save(cache: &SharedCache, path: &Path) -> Result<usize> {
    // dump() evicts stale entries, so it needs the write lock
    let records = cache.write().await.dump();
    let bytes = serde_json::to_vec(&records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let staging = path.with_extension("tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await?;

    debug!(records = records.len(), path = %path.display(), "Snapshot written");
    Ok(records.len())
}

// == Restore ==
/// Replaces the cache contents with the snapshot at `path`.
///
/// A missing file restores nothing and is not an error. Expired records are
/// skipped by the cache's `load`. Returns the number of entries now cached.
pub async fn restore(cache: &SharedCache, path: &Path) -> Result<usize> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };
    let records: Vec<SnapshotRecord> = serde_json::from_slice(&bytes)?;

    let mut guard = cache.write().await;
    guard.load(records);
    Ok(guard.item_count())
}
