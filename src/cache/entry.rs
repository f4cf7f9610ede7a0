//! Cache Entry Module
//!
//! Defines the record kept for each live key, and the single staleness rule
//! every read path goes through.

// == Cache Entry ==
/// Bookkeeping for one cached value. The key lives in the owning map.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Position in the recency ordering (higher = more recent)
    pub stamp: u64,
    /// Weight counted against the cache's capacity
    pub weight: usize,
    /// Insertion time in milliseconds, 0 when no age policy applied at insertion
    pub inserted_at: u64,
    /// Effective max age in milliseconds, 0 = none
    pub max_age: u64,
}

impl<V> Entry<V> {
    // == Constructor ==
    pub fn new(value: V, stamp: u64, weight: usize, inserted_at: u64, max_age: u64) -> Self {
        Self {
            value,
            stamp,
            weight,
            inserted_at,
            max_age,
        }
    }

    // == Is Stale ==
    /// Checks whether the entry has outlived its max age at time `now`.
    ///
    /// The entry's own max age wins; the cache-wide `cache_max_age` only
    /// applies to entries stored without one. An age exactly equal to the max
    /// age is still fresh.
    ///
    /// Entries stored while no age policy was active carry `inserted_at == 0`,
    /// so enabling a cache-wide max age later makes them stale at once.
    pub fn is_stale(&self, cache_max_age: u64, now: u64) -> bool {
        if self.max_age == 0 && cache_max_age == 0 {
            return false;
        }

        let age = now.saturating_sub(self.inserted_at);
        if self.max_age > 0 {
            age > self.max_age
        } else {
            age > cache_max_age
        }
    }

    // == Expires At ==
    /// Absolute expiry time in milliseconds, or 0 when the entry never expires.
    pub fn expires_at(&self) -> u64 {
        if self.max_age == 0 {
            0
        } else {
            self.inserted_at.saturating_add(self.max_age)
        }
    }
}
