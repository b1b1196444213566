//! Process-wide memoization caches.
//!
//! [`SharedCache`] maps keys to values that are expensive to build but never
//! change once built: derived tables and generated codecs. Lookups take a
//! read lock. A miss builds the value with no lock held and then publishes
//! it with insert-if-absent, so two threads racing on the same key may both
//! build, but every caller observes the single published value.
//!
//! [`LocalCache`] is a per-worker view that remembers what it has already
//! fetched from a shared cache and skips the lock afterwards.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::stats::CacheStats;

/// A concurrent, grow-only memoization map.
pub struct SharedCache<K, V> {
    /// Label used in log events.
    name: &'static str,
    map: RwLock<HashMap<K, V>>,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V: Clone> SharedCache<K, V> {
    /// Creates an empty cache.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            map: RwLock::new(HashMap::new()),
            stats: CacheStats::new(),
        }
    }

    /// Returns the published value for a key.
    pub fn get(&self, key: &K) -> Option<V> {
        let found = self.map.read().get(key).cloned();
        match found {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        found
    }

    /// Returns the published value, building and publishing it on a miss.
    pub fn get_or_insert_with<F>(&self, key: &K, load: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        self.publish(key.clone(), load())
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// A failed build publishes nothing.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = load()?;
        Ok(self.publish(key.clone(), value))
    }

    /// Inserts a value unless one is already published; returns the winner.
    pub fn publish(&self, key: K, value: V) -> V {
        let mut map = self.map.write();
        match map.entry(key) {
            Entry::Occupied(entry) => {
                warn!(cache = self.name, "concurrently built value lost publication race");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                self.stats.record_insert();
                entry.insert(value).clone()
            }
        }
    }

    /// Returns true if a value is published for the key.
    pub fn contains(&self, key: &K) -> bool {
        self.map.read().contains_key(key)
    }

    /// Returns the number of published values.
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    /// Returns true if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Returns the cache name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// A worker-local view over a [`SharedCache`].
pub struct LocalCache<K, V> {
    shared: Arc<SharedCache<K, V>>,
    seen: HashMap<K, V>,
}

impl<K: Hash + Eq + Clone, V: Clone> LocalCache<K, V> {
    /// Creates an empty view over a shared cache.
    pub fn new(shared: Arc<SharedCache<K, V>>) -> Self {
        Self {
            shared,
            seen: HashMap::new(),
        }
    }

    /// Returns the value for a key, consulting the shared cache on a local
    /// miss and building it there if needed.
    pub fn get_or_try_insert_with<E, F>(&mut self, key: &K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.seen.get(key) {
            return Ok(value.clone());
        }
        let value = self.shared.get_or_try_insert_with(key, load)?;
        self.seen.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Returns the number of locally remembered values.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if nothing is remembered locally.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Returns the shared cache behind this view.
    pub fn shared(&self) -> &Arc<SharedCache<K, V>> {
        &self.shared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn test_get_or_insert_with() {
        let cache = SharedCache::new("test");
        assert!(cache.is_empty());

        let a = cache.get_or_insert_with(&1, || Arc::new("one"));
        let b = cache.get_or_insert_with(&1, || Arc::new("uno"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, "one");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts(), 1);
    }

    #[test]
    fn test_failed_build_publishes_nothing() {
        let cache: SharedCache<u32, u32> = SharedCache::new("test");
        let result = cache.get_or_try_insert_with(&1, || Err("bad"));
        assert_eq!(result, Err("bad"));
        assert!(!cache.contains(&1));

        assert_eq!(cache.get_or_try_insert_with(&1, || Ok::<_, ()>(5)), Ok(5));
    }

    #[test]
    fn test_publish_keeps_first() {
        let cache = SharedCache::new("test");
        assert_eq!(cache.publish("k", 1), 1);
        assert_eq!(cache.publish("k", 2), 1);
        assert_eq!(cache.get(&"k"), Some(1));
    }

    #[test]
    fn test_concurrent_callers_see_one_value() {
        let cache: SharedCache<&str, Arc<usize>> = SharedCache::new("test");
        let builds = AtomicUsize::new(0);
        let barrier = Barrier::new(8);

        let results: Vec<Arc<usize>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.get_or_insert_with(&"codec", || {
                            Arc::new(builds.fetch_add(1, Ordering::SeqCst))
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(builds.load(Ordering::SeqCst) >= 1);
        for result in &results {
            assert!(Arc::ptr_eq(result, &results[0]));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_local_view() {
        let shared = Arc::new(SharedCache::new("test"));
        let mut local = LocalCache::new(Arc::clone(&shared));
        let mut other = LocalCache::new(Arc::clone(&shared));

        let a = local.get_or_try_insert_with(&"t", || Ok::<_, ()>(Arc::new(1))).unwrap();
        let b = other.get_or_try_insert_with(&"t", || Ok::<_, ()>(Arc::new(2))).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(local.len(), 1);
        assert_eq!(shared.len(), 1);

        // A local hit does not touch the shared cache
        let accesses = shared.stats().lookups();
        local.get_or_try_insert_with(&"t", || Ok::<_, ()>(Arc::new(3))).unwrap();
        assert_eq!(shared.stats().lookups(), accesses);
    }
}
