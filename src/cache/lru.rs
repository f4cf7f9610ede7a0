//! Recency Index Module
//!
//! Orders live keys by recency stamp for LRU eviction and ordered iteration.

use std::collections::BTreeMap;

// == Recency Index ==
/// Tracks access order for LRU eviction.
///
/// Keys are stored by stamp in a BTreeMap where:
/// - First entry = least recently used
/// - Last entry = most recently used
///
/// Stamps come from a `u64` cursor that wraps to zero on overflow. A stamp
/// issued after the wrap sorts as the oldest, so ordering across the wrap
/// point is not preserved.
#[derive(Debug)]
pub struct RecencyIndex<K> {
    /// Keys by recency stamp
    order: BTreeMap<u64, K>,
    /// Next stamp to hand out
    cursor: u64,
}

impl<K> Default for RecencyIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> RecencyIndex<K> {
    // == Constructor ==
    /// Creates a new empty index with the cursor at zero.
    pub fn new() -> Self {
        Self::with_cursor(0)
    }

    /// Creates an empty index whose next stamp is `cursor`.
    pub(crate) fn with_cursor(cursor: u64) -> Self {
        Self {
            order: BTreeMap::new(),
            cursor,
        }
    }

    fn next_stamp(&mut self) -> u64 {
        let stamp = self.cursor;
        self.cursor = self.cursor.wrapping_add(1);
        stamp
    }

    // == Insert ==
    /// Records `key` as the most recently used and returns its stamp.
    pub fn insert(&mut self, key: K) -> u64 {
        let stamp = self.next_stamp();
        self.order.insert(stamp, key);
        stamp
    }

    // == Touch ==
    /// Moves the key at `stamp` to the most recent position.
    ///
    /// Returns the new stamp, or the old one unchanged if nothing lives there.
    pub fn touch(&mut self, stamp: u64) -> u64 {
        match self.order.remove(&stamp) {
            Some(key) => self.insert(key),
            None => stamp,
        }
    }

    // == Remove ==
    /// Removes the key at `stamp`.
    pub fn remove(&mut self, stamp: u64) -> Option<K> {
        self.order.remove(&stamp)
    }

    // == Pop Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if the index is empty.
    pub fn pop_oldest(&mut self) -> Option<K> {
        self.order.pop_first().map(|(_, key)| key)
    }

    /// Returns the stamp of the least recently used key.
    #[cfg(test)]
    pub(crate) fn oldest_stamp(&self) -> Option<u64> {
        self.order.first_key_value().map(|(stamp, _)| *stamp)
    }

    /// Returns the next stamp that will be handed out.
    #[cfg(test)]
    pub(crate) fn cursor(&self) -> u64 {
        self.cursor
    }

    #[cfg(test)]
    pub(crate) fn key_at(&self, stamp: u64) -> Option<&K> {
        self.order.get(&stamp)
    }

    // == Iteration ==
    /// Iterates keys from most to least recently used.
    pub fn newest_first(&self) -> impl Iterator<Item = &K> {
        self.order.values().rev()
    }

    /// Iterates keys from least to most recently used.
    pub fn oldest_first(&self) -> impl Iterator<Item = &K> {
        self.order.values()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    /// Drops every key and rewinds the cursor to zero.
    pub fn clear(&mut self) {
        self.order.clear();
        self.cursor = 0;
    }
}
