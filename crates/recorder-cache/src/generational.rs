//! Two-generation cache for compiled queries.
//!
//! New entries land in a bounded *new generation*. Every hit on a
//! new-generation entry bumps its use counter; once the counter reaches the
//! promotion threshold the entry moves to the unbounded *old generation*,
//! where it stays for the lifetime of the cache.
//!
//! When the new generation is full, the entry inserted first is evicted.
//! Reads never change eviction order. The new generation is an arena of
//! slots plus a queue of `(slot, sequence)` pairs in insertion order; a
//! queue entry whose sequence no longer matches its slot is stale and is
//! skipped.
//!
//! The cache is single-owner: it takes `&mut self` for lookups and holds no
//! locks. Each worker keeps its own.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use recorder_common::QueryCacheConfig;
use tracing::debug;

use crate::stats::CacheStats;

/// A new-generation entry.
struct Slot<K, V> {
    key: K,
    value: V,
    uses: u32,
    seq: u64,
}

/// Bounded, insertion-ordered map backing the new generation.
struct NewGeneration<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    order: VecDeque<(usize, u64)>,
    next_seq: u64,
}

impl<K: Hash + Eq + Clone, V> NewGeneration<K, V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            order: VecDeque::with_capacity(capacity),
            next_seq: 0,
        }
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn get(&self, key: &K) -> Option<&Slot<K, V>> {
        let &i = self.index.get(key)?;
        self.slots[i].as_ref()
    }

    fn get_mut(&mut self, key: &K) -> Option<&mut Slot<K, V>> {
        let &i = self.index.get(key)?;
        self.slots[i].as_mut()
    }

    /// Inserts or replaces an entry, returning the key evicted to make room.
    fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(slot) = self.get_mut(&key) {
            // Replacing keeps the original insertion position.
            slot.value = value;
            slot.uses = 0;
            return None;
        }

        let evicted = if self.len() >= self.capacity {
            self.evict_oldest()
        } else {
            None
        };

        let seq = self.next_seq;
        self.next_seq += 1;
        let slot = Slot {
            key: key.clone(),
            value,
            uses: 0,
            seq,
        };
        let i = match self.free.pop() {
            Some(i) => {
                self.slots[i] = Some(slot);
                i
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, i);
        self.order.push_back((i, seq));

        evicted
    }

    fn remove(&mut self, key: &K) -> Option<Slot<K, V>> {
        let i = self.index.remove(key)?;
        let slot = self.slots[i].take();
        self.free.push(i);
        self.compact_if_sparse();
        slot
    }

    fn evict_oldest(&mut self) -> Option<K> {
        while let Some((i, seq)) = self.order.pop_front() {
            match self.slots[i].take() {
                Some(slot) if slot.seq == seq => {
                    self.index.remove(&slot.key);
                    self.free.push(i);
                    return Some(slot.key);
                }
                other => self.slots[i] = other,
            }
        }
        None
    }

    /// Drops stale queue entries once they outnumber live ones.
    fn compact_if_sparse(&mut self) {
        if self.order.len() > 2 * self.capacity.max(self.len()) {
            let slots = &self.slots;
            self.order
                .retain(|&(i, seq)| matches!(&slots[i], Some(slot) if slot.seq == seq));
        }
    }

    fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.iter().filter_map(move |&(i, seq)| {
            self.slots[i]
                .as_ref()
                .filter(|slot| slot.seq == seq)
                .map(|slot| &slot.key)
        })
    }

    fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.order.clear();
    }
}

/// A single-owner, two-generation cache.
///
/// # Example
///
/// ```
/// use recorder_cache::GenerationalCache;
///
/// let mut cache = GenerationalCache::new(2, 2);
/// cache.put("a", 1);
///
/// assert_eq!(cache.get(&"a"), Some(1));
/// assert!(cache.in_new_generation(&"a"));
///
/// // Second hit reaches the threshold and promotes the entry
/// assert_eq!(cache.get(&"a"), Some(1));
/// assert!(cache.in_old_generation(&"a"));
/// ```
pub struct GenerationalCache<K, V> {
    /// Provisional, evictable entries.
    new_gen: NewGeneration<K, V>,
    /// Permanent entries.
    old_gen: HashMap<K, V>,
    /// Hits needed to leave the new generation.
    promote_threshold: u32,
    /// Statistics.
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V: Clone> GenerationalCache<K, V> {
    /// Creates a cache with the given new-generation capacity and promotion
    /// threshold. Both are clamped to at least one.
    pub fn new(new_gen_size: usize, promote_threshold: u32) -> Self {
        Self {
            new_gen: NewGeneration::new(new_gen_size.max(1)),
            old_gen: HashMap::new(),
            promote_threshold: promote_threshold.max(1),
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &QueryCacheConfig) -> Self {
        Self::new(config.new_gen_size, config.promote_threshold)
    }

    /// Looks up a key.
    ///
    /// Old-generation hits return directly. New-generation hits count
    /// towards promotion; the hit that reaches the threshold moves the
    /// entry to the old generation.
    pub fn get(&mut self, key: &K) -> Option<V> {
        if let Some(value) = self.old_gen.get(key) {
            self.stats.record_hit();
            return Some(value.clone());
        }

        let threshold = self.promote_threshold;
        let slot = match self.new_gen.get_mut(key) {
            Some(slot) => slot,
            None => {
                self.stats.record_miss();
                return None;
            }
        };
        self.stats.record_hit();
        slot.uses += 1;
        if slot.uses < threshold {
            return Some(slot.value.clone());
        }

        let slot = self.new_gen.remove(key)?;
        self.stats.record_promotion();
        debug!(
            uses = slot.uses,
            old_gen = self.old_gen.len() + 1,
            "promoted query cache entry"
        );
        let value = slot.value.clone();
        self.old_gen.insert(slot.key, slot.value);
        Some(value)
    }

    /// Inserts a value into the new generation with a zero use count.
    ///
    /// Keys already in the old generation are left alone. Re-inserting a
    /// new-generation key replaces its value and resets its counter without
    /// changing its eviction position.
    pub fn put(&mut self, key: K, value: V) {
        if self.old_gen.contains_key(&key) {
            return;
        }
        self.stats.record_insert();
        if self.new_gen.insert(key, value).is_some() {
            self.stats.record_eviction();
            debug!(
                capacity = self.new_gen.capacity,
                "evicted oldest query cache entry"
            );
        }
    }

    /// Looks up a key, computing and inserting the value on a miss.
    pub fn get_or_insert_with<E, F>(&mut self, key: &K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.put(key.clone(), value.clone());
        Ok(value)
    }

    /// Returns true if the key is in the new generation.
    pub fn in_new_generation(&self, key: &K) -> bool {
        self.new_gen.contains(key)
    }

    /// Returns true if the key is in the old generation.
    pub fn in_old_generation(&self, key: &K) -> bool {
        self.old_gen.contains_key(key)
    }

    /// Returns the use count of a new-generation entry.
    pub fn use_count(&self, key: &K) -> Option<u32> {
        self.new_gen.get(key).map(|slot| slot.uses)
    }

    /// Returns new-generation keys, oldest first.
    pub fn new_generation_keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.new_gen.keys()
    }

    /// Returns the number of new-generation entries.
    pub fn new_gen_len(&self) -> usize {
        self.new_gen.len()
    }

    /// Returns the number of old-generation entries.
    pub fn old_gen_len(&self) -> usize {
        self.old_gen.len()
    }

    /// Returns the total number of entries.
    pub fn len(&self) -> usize {
        self.new_gen.len() + self.old_gen.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the new-generation capacity.
    pub fn new_gen_capacity(&self) -> usize {
        self.new_gen.capacity
    }

    /// Returns the promotion threshold.
    pub fn promote_threshold(&self) -> u32 {
        self.promote_threshold
    }

    /// Drops every entry from both generations.
    pub fn clear(&mut self) {
        self.new_gen.clear();
        self.old_gen.clear();
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
