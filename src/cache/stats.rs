//! Cache Statistics Module
//!
//! Counters for lookups and for every way an entry can leave the cache,
//! plus size gauges filled in when a snapshot is taken.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of lookups that returned a value
    pub hits: u64,
    /// Number of lookups that returned nothing (absent or rejected stale)
    pub misses: u64,
    /// Number of entries evicted by trimming
    pub evictions: u64,
    /// Number of entries removed because they were stale
    pub expirations: u64,
    /// Number of sets rejected for exceeding the capacity on their own
    pub rejections: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current total weight of the cache
    pub total_weight: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get`/`peek` calls counted so far.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Fraction of lookups that returned a value, 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    // == Update Gauges ==
    /// Updates the entry count and weight gauges.
    pub fn set_totals(&mut self, entries: usize, weight: usize) {
        self.total_entries = entries;
        self.total_weight = weight;
    }
}
