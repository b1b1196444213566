//! Hit, miss, and churn counters shared by the cache types.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounters {
    /// Lookups that found an entry.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Entries stored.
    pub inserts: u64,
    /// Entries dropped to make room.
    pub evictions: u64,
    /// Entries moved to the permanent tier.
    pub promotions: u64,
}

impl CacheCounters {
    /// Returns hits plus misses.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Live counters of one cache.
///
/// Counters use relaxed atomics, so a [`counters`](Self::counters) copy
/// taken while other threads are busy is not a consistent cut.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    promotions: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

impl CacheStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        bump(&self.hits);
    }

    pub(crate) fn record_miss(&self) {
        bump(&self.misses);
    }

    pub(crate) fn record_insert(&self) {
        bump(&self.inserts);
    }

    pub(crate) fn record_eviction(&self) {
        bump(&self.evictions);
    }

    pub(crate) fn record_promotion(&self) {
        bump(&self.promotions);
    }

    /// Returns lookups that found an entry.
    pub fn hits(&self) -> u64 {
        read(&self.hits)
    }

    /// Returns lookups that found nothing.
    pub fn misses(&self) -> u64 {
        read(&self.misses)
    }

    /// Returns hits plus misses.
    pub fn lookups(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Returns entries stored.
    pub fn inserts(&self) -> u64 {
        read(&self.inserts)
    }

    /// Returns entries evicted.
    pub fn evictions(&self) -> u64 {
        read(&self.evictions)
    }

    /// Returns entries promoted.
    pub fn promotions(&self) -> u64 {
        read(&self.promotions)
    }

    /// Copies every counter.
    pub fn counters(&self) -> CacheCounters {
        CacheCounters {
            hits: self.hits(),
            misses: self.misses(),
            inserts: self.inserts(),
            evictions: self.evictions(),
            promotions: self.promotions(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_insert();
        stats.record_promotion();

        assert_eq!(stats.lookups(), 3);
        assert_eq!(
            stats.counters(),
            CacheCounters {
                hits: 2,
                misses: 1,
                inserts: 1,
                evictions: 0,
                promotions: 1,
            }
        );
        assert_eq!(stats.counters().lookups(), 3);
    }
}
