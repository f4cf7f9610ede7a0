//! Recency Cache - A bounded LRU cache with max-age staleness
//!
//! The [`cache`] module is a standalone library: weighted LRU eviction, lazy
//! per-entry or cache-wide max age, and a disposal callback for every entry
//! that leaves. The remaining modules embed it in a small HTTP server with
//! snapshot persistence.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod snapshot;
pub mod tasks;

pub use api::{AppState, SharedCache};
pub use cache::{CacheOptions, CacheStats, Clock, DumpRecord, LruCache, ManualClock, SystemClock};
pub use config::Config;
pub use tasks::spawn_snapshot_task;
