//! Cache Options Module
//!
//! Construction-time configuration for [`LruCache`](crate::cache::LruCache).

use std::fmt;
use std::sync::Arc;

use crate::cache::{Clock, SystemClock};

/// Computes the weight of an entry from its value and key.
pub type LengthFn<K, V> = Box<dyn Fn(&V, &K) -> usize + Send + Sync>;

/// Called once for every entry that leaves the cache.
pub type DisposeFn<K, V> = Box<dyn FnMut(&K, &V) + Send + Sync>;

/// Capacity value meaning "no limit".
pub const UNBOUNDED: usize = usize::MAX;

// == Cache Options ==
/// Configuration for a new cache.
///
/// A bare `usize` converts into options with only `max` set:
///
/// ```
/// use recency_cache::{CacheOptions, LruCache};
///
/// let mut cache: LruCache<&str, u32> = LruCache::new(2);
/// cache.set("a", 1);
///
/// let mut weighted: LruCache<&str, String> = LruCache::new(
///     CacheOptions::new()
///         .max(10)
///         .length(|value: &String, _key: &&str| value.len()),
/// );
/// assert!(weighted.set("b", "hello".to_string()));
/// assert!(!weighted.set("c", "far too long".to_string()));
/// ```
pub struct CacheOptions<K, V> {
    /// Capacity ceiling on total weight, 0 = unbounded
    pub max: usize,
    /// Cache-wide max age in milliseconds, 0 = none
    pub max_age: u64,
    /// Return stale values once before evicting them
    pub stale: bool,
    /// Weight function, None = every entry weighs 1
    pub length: Option<LengthFn<K, V>>,
    /// Removal callback
    pub dispose: Option<DisposeFn<K, V>>,
    /// Skip the removal callback when `set` replaces a value
    pub no_dispose_on_set: bool,
    /// Refresh an entry's age when `get` hits it
    pub update_age_on_get: bool,
    /// Time source, wall clock when None
    pub clock: Option<Arc<dyn Clock>>,
}

impl<K, V> CacheOptions<K, V> {
    pub fn new() -> Self {
        Self {
            max: 0,
            max_age: 0,
            stale: false,
            length: None,
            dispose: None,
            no_dispose_on_set: false,
            update_age_on_get: false,
            clock: None,
        }
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    pub fn max_age(mut self, max_age_ms: u64) -> Self {
        self.max_age = max_age_ms;
        self
    }

    pub fn stale(mut self, stale: bool) -> Self {
        self.stale = stale;
        self
    }

    pub fn length<F>(mut self, length: F) -> Self
    where
        F: Fn(&V, &K) -> usize + Send + Sync + 'static,
    {
        self.length = Some(Box::new(length));
        self
    }

    pub fn dispose<F>(mut self, dispose: F) -> Self
    where
        F: FnMut(&K, &V) + Send + Sync + 'static,
    {
        self.dispose = Some(Box::new(dispose));
        self
    }

    pub fn no_dispose_on_set(mut self, no_dispose_on_set: bool) -> Self {
        self.no_dispose_on_set = no_dispose_on_set;
        self
    }

    pub fn update_age_on_get(mut self, update_age_on_get: bool) -> Self {
        self.update_age_on_get = update_age_on_get;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Resolves the clock, falling back to wall-clock time.
    pub(crate) fn take_clock(&mut self) -> Arc<dyn Clock> {
        self.clock.take().unwrap_or_else(|| Arc::new(SystemClock))
    }
}

impl<K, V> Default for CacheOptions<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> From<usize> for CacheOptions<K, V> {
    fn from(max: usize) -> Self {
        Self::new().max(max)
    }
}

impl<K, V> fmt::Debug for CacheOptions<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("max", &self.max)
            .field("max_age", &self.max_age)
            .field("stale", &self.stale)
            .field("length", &self.length.is_some())
            .field("dispose", &self.dispose.is_some())
            .field("no_dispose_on_set", &self.no_dispose_on_set)
            .field("update_age_on_get", &self.update_age_on_get)
            .field("clock", &self.clock)
            .finish()
    }
}

/// Maps a requested capacity to the stored one: 0 means unbounded.
pub(crate) fn normalize_max(max: usize) -> usize {
    if max == 0 {
        UNBOUNDED
    } else {
        max
    }
}

/// Weighs an entry with the configured function, or 1 without one.
pub(crate) fn weigh<K, V>(length: &Option<LengthFn<K, V>>, value: &V, key: &K) -> usize {
    match length {
        Some(length) => length(value, key),
        None => 1,
    }
}
