//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Snapshot: Persists the cache's dump to disk at configured intervals

mod snapshot;

pub use snapshot::spawn_snapshot_task;
