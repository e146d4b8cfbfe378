//! LRU (Least Recently Used) cache implementation
//!
//! A hash index maps each key to its slot in an arena-backed recency list,
//! so lookup, promotion and eviction are all O(1).

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use ahash::RandomState;
use tracing::{debug, trace};

use crate::error::{Error, InvariantError, Result};
use crate::list::{Iter, RecencyList, MAX_PREALLOC};
use crate::stats::CacheStats;

/// LRU cache with fixed capacity
///
/// Every [`get`](Self::get) and [`put`](Self::put) makes the touched key the
/// most recently used one. Inserting a new key into a full cache first evicts
/// the least recently used entry, so `len() <= capacity()` always holds.
///
/// ```
/// use lrucache::LruCache;
///
/// let mut cache = LruCache::new(2)?;
/// cache.put(1, "one");
/// cache.put(2, "two");
/// cache.get(&1);
/// cache.put(3, "three"); // evicts 2
///
/// assert_eq!(cache.get(&2), None);
/// assert_eq!(cache.get(&1), Some(&"one"));
/// # Ok::<(), lrucache::Error>(())
/// ```
pub struct LruCache<K, V, S = RandomState> {
    map: HashMap<K, usize, S>,
    list: RecencyList<K, V>,
    capacity: usize,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Create a new LRU cache with the given capacity
    ///
    /// # Errors
    /// [`Error::InvalidCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, RandomState::new())
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Create a new LRU cache using `hasher` for the key index
    ///
    /// # Errors
    /// [`Error::InvalidCapacity`] if `capacity` is 0.
    pub fn with_hasher(capacity: usize, hasher: S) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity { capacity });
        }

        debug!(capacity, "creating lru cache");

        Ok(Self {
            map: HashMap::with_capacity_and_hasher(capacity.min(MAX_PREALLOC), hasher),
            list: RecencyList::with_capacity(capacity),
            capacity,
            stats: CacheStats::new(),
        })
    }

    /// Get a value from the cache, marking it most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key) {
            Some(&idx) => {
                self.stats.record_hit();
                self.list.move_to_front(idx);
                self.list.value(idx)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Like [`get`](Self::get) but hands out a mutable reference
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.map.get(key) {
            Some(&idx) => {
                self.stats.record_hit();
                self.list.move_to_front(idx);
                self.list.value_mut(idx)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Insert a key-value pair into the cache
    ///
    /// An existing key has its value replaced and is promoted; this never
    /// evicts. A new key on a full cache evicts the least recently used entry
    /// first.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(slot) = self.list.value_mut(idx) {
                *slot = value;
            }
            self.list.move_to_front(idx);
            self.stats.record_update();
            return;
        }

        if self.list.len() >= self.capacity {
            self.evict();
        }

        let idx = self.list.push_front(key.clone(), value);
        self.map.insert(key, idx);
        self.stats.record_insert();

        debug_assert_eq!(self.map.len(), self.list.len());
        debug_assert!(self.list.len() <= self.capacity);
    }

    /// Get a value without touching its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).and_then(|&idx| self.list.value(idx))
    }

    /// Check for a key without touching its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove a key from the cache
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        let (_, value) = self.list.remove(idx)?;
        trace!(len = self.list.len(), "removed entry");
        Some(value)
    }

    /// Remove and return the least recently used entry
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        let (key, value) = self.list.pop_back()?;
        self.map.remove(&key);
        Some((key, value))
    }

    /// The entry that would be evicted next
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back().and_then(|idx| self.list.get(idx))
    }

    /// The most recently touched entry
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.list.front().and_then(|idx| self.list.get(idx))
    }

    /// Audit the index and the recency list against each other. O(n).
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        self.list.check()?;

        if self.map.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {} entries",
                self.map.len(),
                self.list.len()
            )));
        }

        if self.list.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "size {} exceeds capacity {}",
                self.list.len(),
                self.capacity
            )));
        }

        for (key, &idx) in &self.map {
            match self.list.get(idx) {
                Some((stored, _)) if stored == key => {}
                Some(_) => {
                    return Err(InvariantError::new(format!(
                        "index handle {idx} points at an entry for a different key"
                    )))
                }
                None => {
                    return Err(InvariantError::new(format!(
                        "index handle {idx} points at a vacant slot"
                    )))
                }
            }
        }

        Ok(())
    }

    fn evict(&mut self) {
        if let Some((key, _)) = self.list.pop_back() {
            self.map.remove(&key);
            self.stats.record_eviction();
            trace!(capacity = self.capacity, "evicted least recently used entry");
        }
    }
}

impl<K, V, S> LruCache<K, V, S> {
    /// Get the current size of the cache
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.list.len() == 0
    }

    /// Check if the next new key will evict
    pub fn is_full(&self) -> bool {
        self.list.len() == self.capacity
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Clear the cache. Capacity and statistics are kept.
    pub fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    /// Iterate entries from most to least recently used without promoting
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.list.iter()
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.list.iter().map(|(key, _)| key)
    }
}

impl<'a, K, V, S> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for LruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("capacity", &self.capacity)
            .field("entries", &DebugEntries(self))
            .finish()
    }
}

struct DebugEntries<'a, K, V, S>(&'a LruCache<K, V, S>);

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for DebugEntries<'_, K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(cache: &LruCache<i32, i32>) -> Vec<i32> {
        cache.keys().copied().collect()
    }

    #[test]
    fn test_lru_zero_capacity() {
        let result = LruCache::<i32, i32>::new(0);
        assert_eq!(result.unwrap_err(), Error::InvalidCapacity { capacity: 0 });
    }

    #[test]
    fn test_lru_huge_capacity() {
        let mut cache = LruCache::<u8, u8>::new(usize::MAX).unwrap();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.capacity(), usize::MAX);

        cache.put(1, 10);
        cache.put(2, 20);
        assert_eq!(cache.get(&1), Some(&10));
        assert!(!cache.is_full());

        let cache = LruCache::<u64, u64>::new(1 << 48).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_basic() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, "a");
        cache.put(2, "b");

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.len(), 2);
        assert!(cache.is_full());
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c"); // Should evict 1

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&"b"));
        assert_eq!(cache.get(&3), Some(&"c"));
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn test_lru_get_promotes() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, "a");
        cache.put(2, "b");
        cache.get(&1); // Move 1 to front
        cache.put(3, "c"); // Should evict 2

        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&2), None);
        assert_eq!(cache.get(&3), Some(&"c"));
    }

    #[test]
    fn test_lru_overwrite() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, "a");
        cache.put(1, "b"); // Overwrite

        assert_eq!(cache.get(&1), Some(&"b"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts(), 1);
        assert_eq!(cache.stats().updates(), 1);
    }

    #[test]
    fn test_lru_update_when_full_never_evicts() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, 10);
        cache.put(2, 20);
        cache.put(1, 11);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions(), 0);
        assert_eq!(keys(&cache), vec![1, 2]);
        assert_eq!(cache.peek(&1), Some(&11));
        assert_eq!(cache.peek(&2), Some(&20));
    }

    #[test]
    fn test_lru_miss_has_no_side_effects() {
        let mut cache = LruCache::new(3).unwrap();
        cache.put(1, 1);
        cache.put(2, 2);

        assert_eq!(cache.get(&9), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(keys(&cache), vec![2, 1]);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn test_lru_peek_does_not_promote() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, 1);
        cache.put(2, 2);
        assert_eq!(cache.peek(&1), Some(&1));
        assert!(cache.contains(&1));
        cache.put(3, 3);

        assert!(!cache.contains(&1));
        assert_eq!(cache.stats().hits(), 0);
    }

    #[test]
    fn test_lru_get_mut() {
        let mut cache = LruCache::new(2).unwrap();

        cache.put(1, 1);
        cache.put(2, 2);
        if let Some(value) = cache.get_mut(&1) {
            *value += 100;
        }

        assert_eq!(keys(&cache), vec![1, 2]);
        assert_eq!(cache.peek(&1), Some(&101));
    }

    #[test]
    fn test_lru_remove() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put(1, "a");
        cache.put(2, "b");
        cache.put(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.remove(&2), None);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&2), None);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_pop_and_peek_ends() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put(1, 1);
        cache.put(2, 2);
        cache.put(3, 3);

        assert_eq!(cache.peek_mru(), Some((&3, &3)));
        assert_eq!(cache.peek_lru(), Some((&1, &1)));
        assert_eq!(cache.pop_lru(), Some((1, 1)));
        assert_eq!(cache.peek_lru(), Some((&2, &2)));
        assert!(!cache.contains(&1));
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_clear() {
        let mut cache = LruCache::new(3).unwrap();

        cache.put(1, "a");
        cache.put(2, "b");
        cache.clear();

        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.peek_lru(), None);

        cache.put(3, "c");
        assert_eq!(cache.get(&3), Some(&"c"));
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_borrowed_lookup() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put("alpha".to_string(), 1);

        assert_eq!(cache.get("alpha"), Some(&1));
        assert!(cache.contains("alpha"));
        assert_eq!(cache.remove("alpha"), Some(1));
    }

    #[test]
    fn test_lru_capacity_one() {
        let mut cache = LruCache::new(1).unwrap();

        cache.put(1, 1);
        cache.put(2, 2);

        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.get(&2), Some(&2));
        assert_eq!(cache.len(), 1);
        assert!(cache.check_invariants().is_ok());
    }

    #[test]
    fn test_lru_check_detects_index_pointing_at_other_key() {
        let mut cache = LruCache::new(3).unwrap();
        cache.put(1, 1);
        cache.put(2, 2);
        assert!(cache.check_invariants().is_ok());

        let other = cache.map[&2];
        cache.map.insert(1, other);

        let err = cache.check_invariants().unwrap_err();
        assert!(err.message().contains("different key"));
    }

    #[test]
    fn test_lru_check_detects_index_pointing_at_vacant_slot() {
        let mut cache = LruCache::new(3).unwrap();
        cache.put(1, 1);
        cache.put(2, 2);
        let freed = cache.map[&1];
        cache.pop_lru();

        // Sizes still agree; only the handle is wrong
        cache.map.insert(2, freed);

        let err = cache.check_invariants().unwrap_err();
        assert!(err.message().contains("vacant slot"));
    }

    #[test]
    fn test_lru_debug_lists_mru_first() {
        let mut cache = LruCache::new(2).unwrap();
        cache.put(1, 'a');
        cache.put(2, 'b');

        assert_eq!(
            format!("{cache:?}"),
            "LruCache { capacity: 2, entries: {2: 'b', 1: 'a'} }"
        );
    }
}
