//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with recency ordering, weighted
//! capacity and lazy max-age staleness.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::cache::options::{normalize_max, weigh, CacheOptions, DisposeFn, LengthFn, UNBOUNDED};
use crate::cache::{CacheStats, Clock, DumpRecord, Entry, RecencyIndex};

// == LRU Cache ==
/// Bounded cache that evicts least recently used entries once the total
/// weight of its entries exceeds `max`.
///
/// Staleness is checked lazily: an entry past its max age is removed the next
/// time a read path (`get`, `peek`, iteration, `dump`, `prune`) touches it.
/// Every entry that leaves the cache is passed to the `dispose` callback
/// exactly once.
///
/// The cache is single-threaded; share it behind a lock.
pub struct LruCache<K, V> {
    /// Key-value storage
    entries: HashMap<K, Entry<V>>,
    /// Keys ordered by recency stamp
    recency: RecencyIndex<K>,
    /// Capacity on total weight
    max: usize,
    /// Cache-wide max age in milliseconds, 0 = none
    max_age: u64,
    allow_stale: bool,
    no_dispose_on_set: bool,
    update_age_on_get: bool,
    length: Option<LengthFn<K, V>>,
    dispose: Option<DisposeFn<K, V>>,
    /// Sum of all live entry weights, wide enough that it never overflows
    total_weight: u128,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a cache from options, or from a bare capacity.
    pub fn new(options: impl Into<CacheOptions<K, V>>) -> Self {
        Self::with_recency(options.into(), RecencyIndex::new())
    }

    fn with_recency(mut options: CacheOptions<K, V>, recency: RecencyIndex<K>) -> Self {
        let clock = options.take_clock();
        Self {
            entries: HashMap::new(),
            recency,
            max: normalize_max(options.max),
            max_age: options.max_age,
            allow_stale: options.stale,
            no_dispose_on_set: options.no_dispose_on_set,
            update_age_on_get: options.update_age_on_get,
            length: options.length,
            dispose: options.dispose,
            total_weight: 0,
            clock,
            stats: CacheStats::new(),
        }
    }

    // == Set ==
    /// Stores a value under the cache-wide max age.
    ///
    /// See [`set_with_max_age`](Self::set_with_max_age).
    pub fn set(&mut self, key: K, value: V) -> bool {
        self.set_with_max_age(key, value, None)
    }

    /// Stores a value, marking it most recently used.
    ///
    /// `max_age` overrides the cache-wide max age for this entry; `None` or
    /// `Some(0)` falls back to it. Replacing an existing value disposes the
    /// old one unless `no_dispose_on_set` is configured.
    ///
    /// Returns `false` if the value alone outweighs the capacity. In that case
    /// any existing entry for `key` is removed, the rejected value is disposed,
    /// and nothing is stored.
    pub fn set_with_max_age(&mut self, key: K, value: V, max_age: Option<u64>) -> bool {
        let max_age = match max_age {
            Some(age) if age > 0 => age,
            _ => self.max_age,
        };
        let now = if max_age > 0 { self.clock.now_ms() } else { 0 };
        let weight = weigh(&self.length, &value, &key);

        if weight > self.max {
            debug!(weight, max = self.max, "Rejected entry heavier than cache capacity");
            self.del(&key);
            self.dispose_value(&key, &value);
            self.stats.record_rejection();
            return false;
        }

        if let Some(entry) = self.entries.get_mut(&key) {
            let previous = std::mem::replace(&mut entry.value, value);
            self.total_weight = self.total_weight - entry.weight as u128 + weight as u128;
            entry.weight = weight;
            entry.inserted_at = now;
            entry.max_age = max_age;
            entry.stamp = self.recency.touch(entry.stamp);

            if !self.no_dispose_on_set {
                self.dispose_value(&key, &previous);
            }
            self.trim();
            return true;
        }

        let stamp = self.recency.insert(key.clone());
        self.entries
            .insert(key, Entry::new(value, stamp, weight, now, max_age));
        self.total_weight += weight as u128;
        self.trim();
        true
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    ///
    /// A stale entry is removed. Its value is returned one last time when
    /// stale reads are allowed, otherwise the lookup misses.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.lookup(key, true)
    }

    // == Peek ==
    /// Like [`get`](Self::get) but leaves the recency order alone.
    pub fn peek<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.lookup(key, false)
    }

    fn lookup<Q>(&mut self, key: &Q, mark_used: bool) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let stale = match self.entries.get(key) {
            Some(entry) => self.is_stale(entry),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if stale {
            let (_, entry) = self.expire(key)?;
            if self.allow_stale {
                self.stats.record_hit();
                return Some(entry.value);
            }
            self.stats.record_miss();
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        if mark_used {
            if self.update_age_on_get {
                entry.inserted_at = self.clock.now_ms();
            }
            entry.stamp = self.recency.touch(entry.stamp);
        }
        self.stats.record_hit();
        Some(entry.value.clone())
    }

    // == Has ==
    /// Returns true if `key` holds a value that is not stale.
    ///
    /// Never removes anything and ignores the stale-read setting.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.entries
            .get(key)
            .is_some_and(|entry| !self.is_stale(entry))
    }

    // == Remaining TTL ==
    /// Milliseconds until the entry for `key` goes stale.
    ///
    /// Returns 0 when the key is absent or already stale, and `u64::MAX` when
    /// the entry never expires. Pure, like [`has`](Self::has).
    pub fn remaining_ttl<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(entry) = self.entries.get(key) else {
            return 0;
        };
        let max_age = if entry.max_age > 0 { entry.max_age } else { self.max_age };
        if max_age == 0 {
            return u64::MAX;
        }
        if self.is_stale(entry) {
            return 0;
        }
        entry
            .inserted_at
            .saturating_add(max_age)
            .saturating_sub(self.clock.now_ms())
    }

    // == Delete ==
    /// Removes and disposes the entry for `key`.
    ///
    /// Returns whether an entry was removed.
    pub fn del<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove(key).is_some()
    }

    // == Pop ==
    /// Removes and returns the least recently used entry, disposing it.
    pub fn pop(&mut self) -> Option<(K, V)> {
        self.remove_oldest().map(|(key, entry)| (key, entry.value))
    }

    // == Reset ==
    /// Disposes every entry, most recent first, then empties the cache and
    /// rewinds the recency counter.
    pub fn reset(&mut self) {
        if let Some(dispose) = self.dispose.as_mut() {
            for key in self.recency.newest_first() {
                if let Some(entry) = self.entries.get(key) {
                    dispose(key, &entry.value);
                }
            }
        }

        let cleared = self.entries.len();
        self.entries.clear();
        self.recency.clear();
        self.total_weight = 0;
        debug!(cleared, "Cache reset");
    }

    // == Iteration ==
    /// Calls `f(value, key)` for each entry, most recently used first.
    ///
    /// Does not change recency. Stale entries met along the way are removed;
    /// they are still visited when stale reads are allowed.
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, &K),
    {
        let keys: Vec<K> = self.recency.newest_first().cloned().collect();
        self.visit(keys, &mut f);
    }

    /// Same as [`for_each`](Self::for_each), least recently used first.
    pub fn rfor_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&V, &K),
    {
        let keys: Vec<K> = self.recency.oldest_first().cloned().collect();
        self.visit(keys, &mut f);
    }

    fn visit<F>(&mut self, keys: Vec<K>, f: &mut F)
    where
        F: FnMut(&V, &K),
    {
        for key in keys {
            let stale = match self.entries.get(&key) {
                Some(entry) => self.is_stale(entry),
                None => continue,
            };

            if stale {
                if let Some((key, entry)) = self.expire(&key) {
                    if self.allow_stale {
                        f(&entry.value, &key);
                    }
                }
            } else if let Some(entry) = self.entries.get(&key) {
                f(&entry.value, &key);
            }
        }
    }

    /// Returns all keys, most recently used first.
    pub fn keys(&mut self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.entries.len());
        self.for_each(|_, key| keys.push(key.clone()));
        keys
    }

    /// Returns all values, most recently used first.
    pub fn values(&mut self) -> Vec<V>
    where
        V: Clone,
    {
        let mut values = Vec::with_capacity(self.entries.len());
        self.for_each(|value, _| values.push(value.clone()));
        values
    }

    // == Prune ==
    /// Removes every stale entry. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let stale: Vec<K> = self
            .recency
            .oldest_first()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .is_some_and(|entry| self.is_stale(entry))
            })
            .cloned()
            .collect();

        let mut removed = 0;
        for key in &stale {
            if self.expire(key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Pruned stale entries");
        }
        removed
    }

    // == Dump ==
    /// Exports every fresh entry, most recently used first.
    ///
    /// Stale entries are removed and left out regardless of the stale-read
    /// setting.
    pub fn dump(&mut self) -> Vec<DumpRecord<K, V>>
    where
        V: Clone,
    {
        let keys: Vec<K> = self.recency.newest_first().cloned().collect();
        let mut records = Vec::with_capacity(keys.len());

        for key in keys {
            let stale = match self.entries.get(&key) {
                Some(entry) => self.is_stale(entry),
                None => continue,
            };
            if stale {
                self.expire(&key);
                continue;
            }

            let fields = self
                .entries
                .get(&key)
                .map(|entry| (entry.value.clone(), entry.expires_at()));
            if let Some((value, expires_at)) = fields {
                records.push(DumpRecord::new(key, value, expires_at));
            }
        }
        records
    }

    // == Load ==
    /// Resets the cache and restores entries from a [`dump`](Self::dump).
    ///
    /// Records are inserted oldest first so the recency order matches the
    /// dump. Records already past their expiry are skipped; the rest keep
    /// their remaining lifetime as a per-entry max age.
    pub fn load(&mut self, records: Vec<DumpRecord<K, V>>) {
        self.reset();

        let now = self.clock.now_ms();
        let total = records.len();
        for record in records.into_iter().rev() {
            if !record.expires() {
                self.set(record.key, record.value);
            } else if record.expires_at > now {
                let remaining = record.expires_at - now;
                self.set_with_max_age(record.key, record.value, Some(remaining));
            }
        }
        debug!(records = total, loaded = self.entries.len(), "Loaded cache dump");
    }

    // == Configuration Accessors ==
    /// Capacity on total weight. [`UNBOUNDED`](crate::cache::UNBOUNDED) when unlimited.
    pub fn max(&self) -> usize {
        self.max
    }

    /// Changes the capacity, 0 meaning unbounded, and trims to fit.
    pub fn set_max(&mut self, max: usize) {
        self.max = normalize_max(max);
        self.trim();
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    /// Changes the cache-wide max age in milliseconds, 0 meaning none.
    ///
    /// Entries take the cache-wide max age as their own when stored, so this
    /// only affects later sets and entries stored while no max age applied.
    /// The latter carry no insertion time and go stale as soon as a max age
    /// is enabled.
    pub fn set_max_age(&mut self, max_age_ms: u64) {
        self.max_age = max_age_ms;
    }

    pub fn allow_stale(&self) -> bool {
        self.allow_stale
    }

    pub fn set_allow_stale(&mut self, allow_stale: bool) {
        self.allow_stale = allow_stale;
    }

    /// Replaces the weight function, `None` restoring the weight of 1.
    ///
    /// Every live entry is reweighed and the cache trimmed to fit.
    pub fn set_length_calculator(&mut self, length: Option<LengthFn<K, V>>) {
        self.length = length;

        let mut total: u128 = 0;
        for (key, entry) in self.entries.iter_mut() {
            entry.weight = weigh(&self.length, &entry.value, key);
            total += entry.weight as u128;
        }
        self.total_weight = total;
        self.trim();
    }

    // == Length ==
    /// Total weight of all entries, stale ones included.
    ///
    /// Saturates at `usize::MAX` when an unbounded cache holds more.
    pub fn length(&self) -> usize {
        usize::try_from(self.total_weight).unwrap_or(usize::MAX)
    }

    /// Number of entries, stale ones included.
    pub fn item_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_totals(self.entries.len(), self.length());
        stats
    }

    // == Internals ==
    fn is_stale(&self, entry: &Entry<V>) -> bool {
        (entry.max_age > 0 || self.max_age > 0) && entry.is_stale(self.max_age, self.clock.now_ms())
    }

    fn dispose_value(&mut self, key: &K, value: &V) {
        if let Some(dispose) = self.dispose.as_mut() {
            dispose(key, value);
        }
    }

    /// Unlinks the entry for `key` and disposes it.
    fn remove<Q>(&mut self, key: &Q) -> Option<(K, Entry<V>)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (key, entry) = self.entries.remove_entry(key)?;
        self.recency.remove(entry.stamp);
        self.total_weight -= entry.weight as u128;
        self.dispose_value(&key, &entry.value);
        Some((key, entry))
    }

    fn expire<Q>(&mut self, key: &Q) -> Option<(K, Entry<V>)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = self.remove(key)?;
        self.stats.record_expiration();
        trace!(stamp = removed.1.stamp, "Removed stale entry");
        Some(removed)
    }

    fn remove_oldest(&mut self) -> Option<(K, Entry<V>)> {
        let key = self.recency.pop_oldest()?;
        let entry = self.entries.remove(&key)?;
        self.total_weight -= entry.weight as u128;
        self.dispose_value(&key, &entry.value);
        Some((key, entry))
    }

    /// Evicts least recently used entries until the total weight fits.
    fn trim(&mut self) {
        if self.max == UNBOUNDED {
            return;
        }
        while self.total_weight > self.max as u128 {
            match self.remove_oldest() {
                Some((_, entry)) => {
                    self.stats.record_eviction();
                    trace!(
                        weight = entry.weight,
                        total_weight = self.length(),
                        "Evicted least recently used entry"
                    );
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Builds a cache whose recency counter starts at `cursor`.
    pub(crate) fn with_recency_cursor(options: impl Into<CacheOptions<K, V>>, cursor: u64) -> Self {
        Self::with_recency(options.into(), RecencyIndex::with_cursor(cursor))
    }

    /// Checks that the map, the recency index and the weight total agree.
    pub(crate) fn is_consistent(&self) -> bool {
        let weight: u128 = self.entries.values().map(|entry| entry.weight as u128).sum();
        let linked = self
            .entries
            .iter()
            .all(|(key, entry)| self.recency.key_at(entry.stamp) == Some(key));
        weight == self.total_weight && self.recency.len() == self.entries.len() && linked
    }
}

impl<K, V> fmt::Debug for LruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("item_count", &self.entries.len())
            .field("length", &self.total_weight)
            .field("max", &self.max)
            .field("max_age", &self.max_age)
            .field("allow_stale", &self.allow_stale)
            .field("stats", &self.stats)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, UNBOUNDED};
    use std::sync::Mutex;

    type Disposed = Arc<Mutex<Vec<(String, String)>>>;

    fn options(max: usize, clock: &ManualClock, disposed: &Disposed) -> CacheOptions<String, String> {
        let log = disposed.clone();
        CacheOptions::new()
            .max(max)
            .clock(clock.clone())
            .dispose(move |key: &String, value: &String| {
                log.lock().unwrap().push((key.clone(), value.clone()));
            })
    }

    fn cache_with(max: usize) -> (LruCache<String, String>, ManualClock, Disposed) {
        let clock = ManualClock::new(1_000);
        let disposed: Disposed = Arc::default();
        let cache = LruCache::new(options(max, &clock, &disposed));
        (cache, clock, disposed)
    }

    fn set(cache: &mut LruCache<String, String>, key: &str, value: &str) -> bool {
        cache.set(key.to_string(), value.to_string())
    }

    fn disposed_list(disposed: &Disposed) -> Vec<(String, String)> {
        disposed.lock().unwrap().clone()
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn test_cache_new() {
        let cache: LruCache<String, String> = LruCache::new(CacheOptions::new());
        assert_eq!(cache.item_count(), 0);
        assert_eq!(cache.length(), 0);
        assert_eq!(cache.max(), UNBOUNDED);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let (mut cache, _, _) = cache_with(10);

        assert!(set(&mut cache, "key1", "value1"));

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.item_count(), 1);
        assert_eq!(cache.length(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let (mut cache, _, _) = cache_with(10);
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_del_disposes() {
        let (mut cache, _, disposed) = cache_with(10);
        set(&mut cache, "key1", "value1");

        assert!(cache.del("key1"));

        assert!(cache.is_empty());
        assert_eq!(cache.length(), 0);
        assert_eq!(disposed_list(&disposed), vec![pair("key1", "value1")]);
    }

    #[test]
    fn test_del_nonexistent_is_noop() {
        let (mut cache, _, disposed) = cache_with(10);
        set(&mut cache, "key1", "value1");

        assert!(!cache.del("missing"));

        assert_eq!(cache.item_count(), 1);
        assert!(disposed_list(&disposed).is_empty());
    }

    #[test]
    fn test_overwrite_disposes_previous_value() {
        let (mut cache, _, disposed) = cache_with(10);

        set(&mut cache, "key1", "value1");
        assert!(set(&mut cache, "key1", "value2"));

        assert_eq!(cache.get("key1"), Some("value2".to_string()));
        assert_eq!(cache.item_count(), 1);
        assert_eq!(disposed_list(&disposed), vec![pair("key1", "value1")]);
    }

    #[test]
    fn test_overwrite_without_dispose_on_set() {
        let clock = ManualClock::new(0);
        let disposed: Disposed = Arc::default();
        let mut cache = LruCache::new(options(10, &clock, &disposed).no_dispose_on_set(true));

        set(&mut cache, "key1", "value1");
        set(&mut cache, "key1", "value2");

        assert!(disposed_list(&disposed).is_empty());
        cache.del("key1");
        assert_eq!(disposed_list(&disposed), vec![pair("key1", "value2")]);
    }

    #[test]
    fn test_overwrite_bumps_recency() {
        let (mut cache, _, _) = cache_with(2);

        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");
        set(&mut cache, "a", "3");
        set(&mut cache, "c", "4");

        assert!(cache.has("a"));
        assert!(!cache.has("b"));
    }

    #[test]
    fn test_lru_eviction() {
        let (mut cache, _, disposed) = cache_with(3);

        set(&mut cache, "key1", "value1");
        set(&mut cache, "key2", "value2");
        set(&mut cache, "key3", "value3");
        set(&mut cache, "key4", "value4");

        assert_eq!(cache.item_count(), 3);
        assert!(!cache.has("key1"));
        assert!(cache.has("key4"));
        assert_eq!(disposed_list(&disposed), vec![pair("key1", "value1")]);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_get_marks_used() {
        let (mut cache, _, _) = cache_with(3);

        set(&mut cache, "key1", "value1");
        set(&mut cache, "key2", "value2");
        set(&mut cache, "key3", "value3");

        cache.get("key1");
        set(&mut cache, "key4", "value4");

        assert!(cache.has("key1"));
        assert!(!cache.has("key2"));
    }

    #[test]
    fn test_peek_leaves_recency_alone() {
        let (mut cache, _, _) = cache_with(2);

        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");

        assert_eq!(cache.peek("a"), Some("1".to_string()));
        set(&mut cache, "c", "3");

        assert!(!cache.has("a"));
        assert!(cache.has("b"));
    }

    #[test]
    fn test_stale_get_misses_and_disposes() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_max_age(5);

        set(&mut cache, "x", "1");
        clock.advance(10);

        assert_eq!(cache.get("x"), None);
        assert!(cache.is_empty());
        assert_eq!(disposed_list(&disposed), vec![pair("x", "1")]);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_stale_allowed_returns_value_once() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_allow_stale(true);

        cache.set_with_max_age("x".to_string(), "1".to_string(), Some(10));
        clock.advance(11);

        assert_eq!(cache.get("x"), Some("1".to_string()));
        assert_eq!(cache.get("x"), None);
        assert_eq!(disposed_list(&disposed), vec![pair("x", "1")]);
    }

    #[test]
    fn test_stale_peek_also_evicts() {
        let (mut cache, clock, disposed) = cache_with(10);

        cache.set_with_max_age("x".to_string(), "1".to_string(), Some(10));
        clock.advance(11);

        assert_eq!(cache.peek("x"), None);
        assert_eq!(disposed_list(&disposed).len(), 1);
    }

    #[test]
    fn test_stale_peek_allowed_returns_value_once() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_allow_stale(true);

        cache.set_with_max_age("x".to_string(), "1".to_string(), Some(10));
        clock.advance(11);

        assert_eq!(cache.peek("x"), Some("1".to_string()));
        assert!(cache.is_empty());
        assert_eq!(cache.peek("x"), None);
        assert_eq!(disposed_list(&disposed), vec![pair("x", "1")]);
    }

    #[test]
    fn test_entry_age_at_boundary_is_fresh() {
        let (mut cache, clock, _) = cache_with(10);

        cache.set_with_max_age("x".to_string(), "1".to_string(), Some(10));
        clock.advance(10);

        assert_eq!(cache.get("x"), Some("1".to_string()));
    }

    #[test]
    fn test_has_reports_stale_without_removing() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_allow_stale(true);

        cache.set_with_max_age("x".to_string(), "1".to_string(), Some(10));
        assert!(cache.has("x"));

        clock.advance(11);

        assert!(!cache.has("x"));
        assert_eq!(cache.item_count(), 1);
        assert!(disposed_list(&disposed).is_empty());
    }

    #[test]
    fn test_per_entry_max_age_overrides_default() {
        let (mut cache, clock, _) = cache_with(10);
        cache.set_max_age(100);

        cache.set_with_max_age("short".to_string(), "1".to_string(), Some(5));
        set(&mut cache, "default", "2");
        clock.advance(50);

        assert!(!cache.has("short"));
        assert!(cache.has("default"));
    }

    #[test]
    fn test_oversized_new_key_rejected() {
        let clock = ManualClock::new(0);
        let disposed: Disposed = Arc::default();
        let mut cache = LruCache::new(
            options(10, &clock, &disposed).length(|value: &String, _: &String| value.len()),
        );

        assert!(!cache.set("big".to_string(), "x".repeat(1000)));

        assert!(cache.is_empty());
        assert_eq!(cache.length(), 0);
        assert_eq!(disposed_list(&disposed), vec![pair("big", &"x".repeat(1000))]);
        assert_eq!(cache.stats().rejections, 1);
    }

    #[test]
    fn test_oversized_replacement_removes_existing() {
        let clock = ManualClock::new(0);
        let disposed: Disposed = Arc::default();
        let mut cache = LruCache::new(
            options(10, &clock, &disposed).length(|value: &String, _: &String| value.len()),
        );

        set(&mut cache, "k", "small");
        assert!(!set(&mut cache, "k", "much too large"));

        assert!(!cache.has("k"));
        assert_eq!(cache.length(), 0);
        assert_eq!(
            disposed_list(&disposed),
            vec![pair("k", "small"), pair("k", "much too large")]
        );
    }

    #[test]
    fn test_weighted_trim_evicts_until_fit() {
        let clock = ManualClock::new(0);
        let disposed: Disposed = Arc::default();
        let mut cache = LruCache::new(
            options(10, &clock, &disposed).length(|value: &String, _: &String| value.len()),
        );

        set(&mut cache, "a", "aaa");
        set(&mut cache, "b", "bbb");
        set(&mut cache, "c", "ccc");
        set(&mut cache, "d", "dddddd");

        assert_eq!(cache.keys(), vec!["d".to_string(), "c".to_string()]);
        assert_eq!(cache.length(), 9);
        assert_eq!(cache.stats().evictions, 2);
    }

    #[test]
    fn test_set_max_trims_and_zero_unbounds() {
        let (mut cache, _, disposed) = cache_with(5);
        for key in ["a", "b", "c", "d", "e"] {
            set(&mut cache, key, key);
        }

        cache.set_max(2);
        assert_eq!(cache.keys(), vec!["e".to_string(), "d".to_string()]);
        assert_eq!(disposed_list(&disposed).len(), 3);

        cache.set_max(0);
        assert_eq!(cache.max(), UNBOUNDED);
        for i in 0..100 {
            set(&mut cache, &i.to_string(), "v");
        }
        assert_eq!(cache.item_count(), 102);
    }

    #[test]
    fn test_length_calculator_reweighs_entries() {
        let (mut cache, _, disposed) = cache_with(6);
        set(&mut cache, "a", "aaa");
        set(&mut cache, "b", "bbb");
        set(&mut cache, "c", "ccc");
        assert_eq!(cache.length(), 3);

        cache.set_length_calculator(Some(Box::new(|value: &String, _: &String| value.len())));

        assert_eq!(cache.length(), 6);
        assert_eq!(cache.item_count(), 2);
        assert_eq!(disposed_list(&disposed), vec![pair("a", "aaa")]);

        cache.set_length_calculator(None);
        assert_eq!(cache.length(), 2);
    }

    #[test]
    fn test_pop_removes_oldest() {
        let (mut cache, _, disposed) = cache_with(10);
        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");
        cache.get("a");

        assert_eq!(cache.pop(), Some(pair("b", "2")));
        assert_eq!(cache.pop(), Some(pair("a", "1")));
        assert_eq!(cache.pop(), None);
        assert_eq!(disposed_list(&disposed), vec![pair("b", "2"), pair("a", "1")]);
    }

    #[test]
    fn test_reset_disposes_everything() {
        let (mut cache, _, disposed) = cache_with(10);
        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");

        cache.reset();

        assert!(cache.is_empty());
        assert_eq!(cache.length(), 0);
        assert_eq!(disposed_list(&disposed), vec![pair("b", "2"), pair("a", "1")]);
        assert_eq!(cache.recency.cursor(), 0);
    }

    #[test]
    fn test_for_each_orders() {
        let (mut cache, _, _) = cache_with(10);
        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");
        set(&mut cache, "c", "3");

        let mut forward = Vec::new();
        cache.for_each(|value, key| forward.push(format!("{key}={value}")));
        let mut reverse = Vec::new();
        cache.rfor_each(|_, key| reverse.push(key.clone()));

        assert_eq!(forward, vec!["c=3", "b=2", "a=1"]);
        assert_eq!(reverse, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_for_each_evicts_stale() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_with_max_age("old".to_string(), "1".to_string(), Some(5));
        set(&mut cache, "new", "2");
        clock.advance(10);

        let mut seen = Vec::new();
        cache.for_each(|_, key| seen.push(key.clone()));

        assert_eq!(seen, vec!["new".to_string()]);
        assert_eq!(disposed_list(&disposed), vec![pair("old", "1")]);
    }

    #[test]
    fn test_for_each_visits_stale_when_allowed() {
        let (mut cache, clock, _) = cache_with(10);
        cache.set_allow_stale(true);
        cache.set_with_max_age("old".to_string(), "1".to_string(), Some(5));
        clock.advance(10);

        let mut seen = Vec::new();
        cache.rfor_each(|_, key| seen.push(key.clone()));

        assert_eq!(seen, vec!["old".to_string()]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_and_values_most_recent_first() {
        let (mut cache, _, _) = cache_with(10);
        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");
        cache.get("a");

        assert_eq!(cache.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.values(), vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_dump_records() {
        let (mut cache, clock, _) = cache_with(10);
        set(&mut cache, "forever", "1");
        cache.set_with_max_age("timed".to_string(), "2".to_string(), Some(500));
        clock.advance(100);

        let dump = cache.dump();

        assert_eq!(
            dump,
            vec![
                DumpRecord::new("timed".to_string(), "2".to_string(), 1_500),
                DumpRecord::new("forever".to_string(), "1".to_string(), 0),
            ]
        );
    }

    #[test]
    fn test_dump_skips_and_evicts_stale_even_when_allowed() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_allow_stale(true);
        cache.set_with_max_age("timed".to_string(), "1".to_string(), Some(5));
        set(&mut cache, "forever", "2");
        clock.advance(10);

        let dump = cache.dump();

        assert_eq!(dump.len(), 1);
        assert_eq!(dump[0].key, "forever");
        assert_eq!(disposed_list(&disposed), vec![pair("timed", "1")]);
    }

    #[test]
    fn test_load_restores_order_and_remaining_age() {
        let (mut cache, clock, _) = cache_with(10);
        let records = vec![
            DumpRecord::new("newest".to_string(), "3".to_string(), 0),
            DumpRecord::new("timed".to_string(), "2".to_string(), 1_200),
            DumpRecord::new("expired".to_string(), "x".to_string(), 900),
            DumpRecord::new("oldest".to_string(), "1".to_string(), 0),
        ];

        cache.load(records);

        assert_eq!(
            cache.keys(),
            vec!["newest".to_string(), "timed".to_string(), "oldest".to_string()]
        );

        clock.advance(200);
        assert!(cache.has("timed"));
        clock.advance(1);
        assert!(!cache.has("timed"));
    }

    #[test]
    fn test_load_resets_existing_entries() {
        let (mut cache, _, disposed) = cache_with(10);
        set(&mut cache, "stale_data", "old");

        cache.load(vec![DumpRecord::new("fresh".to_string(), "new".to_string(), 0)]);

        assert!(!cache.has("stale_data"));
        assert!(cache.has("fresh"));
        assert_eq!(disposed_list(&disposed), vec![pair("stale_data", "old")]);
    }

    #[test]
    fn test_prune_removes_only_stale() {
        let (mut cache, clock, disposed) = cache_with(10);
        cache.set_with_max_age("a".to_string(), "1".to_string(), Some(5));
        cache.set_with_max_age("b".to_string(), "2".to_string(), Some(50));
        set(&mut cache, "c", "3");
        clock.advance(10);

        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.item_count(), 2);
        assert_eq!(disposed_list(&disposed), vec![pair("a", "1")]);
        assert_eq!(cache.prune(), 0);
    }

    #[test]
    fn test_update_age_on_get() {
        let clock = ManualClock::new(1_000);
        let disposed: Disposed = Arc::default();
        let mut cache = LruCache::new(
            options(10, &clock, &disposed)
                .max_age(10)
                .update_age_on_get(true),
        );

        set(&mut cache, "x", "1");
        clock.advance(8);
        assert!(cache.get("x").is_some());
        clock.advance(8);

        assert!(cache.has("x"));
    }

    #[test]
    fn test_untimed_entries_go_stale_when_max_age_enabled() {
        let (mut cache, clock, _) = cache_with(10);
        set(&mut cache, "x", "1");
        clock.set(1_700_000_000_000);

        cache.set_max_age(60_000);

        assert!(!cache.has("x"));
    }

    #[test]
    fn test_max_age_change_keeps_timed_entries() {
        let (mut cache, clock, _) = cache_with(10);
        cache.set_max_age(100);
        set(&mut cache, "timed", "1");

        cache.set_max_age(0);
        set(&mut cache, "untimed", "2");
        clock.advance(101);

        assert!(!cache.has("timed"));
        assert!(cache.has("untimed"));
    }

    #[test]
    fn test_stats_tracking() {
        let (mut cache, _, _) = cache_with(10);

        set(&mut cache, "key1", "value1");
        cache.get("key1");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.total_weight, 1);
    }

    #[test]
    fn test_recency_cursor_wraps_without_losing_entries() {
        let clock = ManualClock::new(0);
        let disposed: Disposed = Arc::default();
        let mut cache = LruCache::with_recency_cursor(options(10, &clock, &disposed), u64::MAX - 1);

        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");
        set(&mut cache, "c", "3");
        cache.get("a");

        assert_eq!(cache.item_count(), 3);
        assert_eq!(cache.length(), 3);
        assert!(cache.is_consistent());
        assert_eq!(cache.recency.cursor(), 2);

        // Stamps issued after the wrap sort oldest: "c" then "a" come first
        assert_eq!(cache.pop(), Some(pair("c", "3")));
        assert_eq!(cache.pop(), Some(pair("a", "1")));
        assert_eq!(cache.pop(), Some(pair("b", "2")));
    }

    #[test]
    fn test_remaining_ttl() {
        let (mut cache, clock, _) = cache_with(10);
        set(&mut cache, "forever", "1");
        cache.set_with_max_age("timed".to_string(), "2".to_string(), Some(100));

        clock.advance(40);

        assert_eq!(cache.remaining_ttl("timed"), 60);
        assert_eq!(cache.remaining_ttl("forever"), u64::MAX);
        assert_eq!(cache.remaining_ttl("missing"), 0);

        clock.advance(61);
        assert_eq!(cache.remaining_ttl("timed"), 0);
        // Pure: the stale entry is still there
        assert_eq!(cache.item_count(), 2);
    }

    #[test]
    fn test_weight_total_beyond_usize_does_not_panic() {
        let half = usize::MAX / 2 + 1;
        let mut cache: LruCache<String, String> =
            LruCache::new(CacheOptions::new().length(move |_: &String, _: &String| half));

        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");
        assert_eq!(cache.item_count(), 2);
        assert_eq!(cache.length(), usize::MAX);
        assert!(cache.is_consistent());

        assert!(cache.del("a"));
        assert_eq!(cache.length(), half);
        assert!(cache.del("b"));
        assert_eq!(cache.length(), 0);
        assert!(cache.is_consistent());
    }

    #[test]
    fn test_heavy_entries_evict_with_exact_weight() {
        let half = usize::MAX / 2 + 1;
        let mut cache: LruCache<String, String> = LruCache::new(
            CacheOptions::new()
                .max(usize::MAX - 1)
                .length(move |_: &String, _: &String| half),
        );

        set(&mut cache, "a", "1");
        set(&mut cache, "b", "2");

        assert_eq!(cache.keys(), vec!["b".to_string()]);
        assert_eq!(cache.length(), half);
        assert!(cache.is_consistent());
    }
}
