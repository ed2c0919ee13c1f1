//! Bounded LRU mapping with per-entry write timestamps.
//!
//! Thin layer over the `lru` crate that additionally remembers when each
//! entry was last written. Recency ("last accessed") drives eviction; the
//! write timestamp ("last modified") drives the TTL logic of the stat
//! cache above and is deliberately untouched by reads.

use std::borrow::Borrow;
use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use thiserror::Error;

use crate::clock;

/// A cache cannot hold anything with zero capacity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cache capacity must be at least 1, got {0}")]
pub struct InvalidCapacity(pub usize);

struct Entry<V> {
    value: V,
    written_at: f64,
}

/// Fixed-capacity mapping with least-recently-used eviction.
///
/// `get` and `set` both refresh an entry's recency; when an insertion
/// exceeds the capacity, the least-recently-used entry is evicted.
/// [`last_modified`](TimedLru::last_modified) reports the wall-clock time
/// of the last `set`, independent of any reads since.
pub struct TimedLru<K: Hash + Eq, V> {
    inner: LruCache<K, Entry<V>>,
}

impl<K: Hash + Eq, V> TimedLru<K, V> {
    /// Create a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Result<Self, InvalidCapacity> {
        let capacity = NonZeroUsize::new(capacity).ok_or(InvalidCapacity(capacity))?;
        Ok(Self {
            inner: LruCache::new(capacity),
        })
    }

    /// Look up a value, refreshing its recency.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key).map(|entry| &entry.value)
    }

    /// Insert or overwrite a value, refreshing recency and the write
    /// timestamp. Evicts the least-recently-used entry on overflow.
    pub fn set(&mut self, key: K, value: V) {
        self.set_at(key, value, clock::epoch_now());
    }

    pub(crate) fn set_at(&mut self, key: K, value: V, now: f64) {
        self.inner.put(key, Entry { value, written_at: now });
    }

    /// Remove an entry, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.pop(key).map(|entry| entry.value)
    }

    /// Whether a key is present. Does not refresh recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains(key)
    }

    /// When the entry was last written, if present. Does not refresh
    /// recency.
    pub fn last_modified<Q>(&self, key: &Q) -> Option<f64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.peek(key).map(|entry| entry.written_at)
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }

    /// Change the capacity. Shrinking evicts immediately, oldest first.
    pub fn resize(&mut self, capacity: usize) -> Result<(), InvalidCapacity> {
        let capacity = NonZeroUsize::new(capacity).ok_or(InvalidCapacity(capacity))?;
        self.inner.resize(capacity);
        Ok(())
    }

    /// Drop all entries, keeping the capacity.
    pub fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(
            TimedLru::<String, u32>::new(0).err(),
            Some(InvalidCapacity(0))
        );
    }

    #[test]
    fn get_and_set() {
        let mut cache = TimedLru::new(4).unwrap();
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get("a"), Some(&1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("a"));
    }

    #[test]
    fn eviction_follows_access_order() {
        let mut cache = TimedLru::new(2).unwrap();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        // Touch "a" so "b" becomes the LRU entry.
        cache.get("a");
        cache.set("c".to_string(), 3);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn overwrite_refreshes_recency() {
        let mut cache = TimedLru::new(2).unwrap();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("a".to_string(), 10);
        cache.set("c".to_string(), 3);

        assert_eq!(cache.get("a"), Some(&10));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn contains_does_not_refresh_recency() {
        let mut cache = TimedLru::new(2).unwrap();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.contains("a");
        cache.set("c".to_string(), 3);

        // "a" was only probed, not accessed, so it was the eviction victim.
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
    }

    #[test]
    fn resize_evicts_oldest_first() {
        let mut cache = TimedLru::new(3).unwrap();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.set("c".to_string(), 3);
        cache.get("a");
        cache.resize(1).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(cache.contains("a"));
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.resize(0), Err(InvalidCapacity(0)));
    }

    #[test]
    fn last_modified_tracks_writes_not_reads() {
        let mut cache = TimedLru::new(4).unwrap();
        cache.set_at("a".to_string(), 1, 100.0);
        assert_eq!(cache.last_modified("a"), Some(100.0));

        cache.get("a");
        assert_eq!(cache.last_modified("a"), Some(100.0));

        cache.set_at("a".to_string(), 2, 200.0);
        assert_eq!(cache.last_modified("a"), Some(200.0));
        assert_eq!(cache.last_modified("missing"), None);
    }

    #[test]
    fn remove_and_clear() {
        let mut cache = TimedLru::new(4).unwrap();
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);

        assert_eq!(cache.remove("a"), Some(1));
        assert_eq!(cache.remove("a"), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
    }
}
