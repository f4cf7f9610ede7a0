//! Cache Module
//!
//! Provides a bounded in-memory cache with weighted LRU eviction, lazy max-age
//! staleness and disposal callbacks.

mod clock;
mod dump;
mod entry;
mod lru;
mod options;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use dump::DumpRecord;
pub use entry::Entry;
pub use lru::RecencyIndex;
pub use options::{CacheOptions, DisposeFn, LengthFn, UNBOUNDED};
pub use stats::CacheStats;
pub use store::LruCache;
