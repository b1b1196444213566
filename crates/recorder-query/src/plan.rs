//! Compiled query plans and the per-worker plan cache.

use std::sync::Arc;

use recorder_cache::{CacheStats, GenerationalCache};
use recorder_common::{QueryCacheConfig, RecorderResult};
use recorder_schema::ScalarType;

use crate::fingerprint::Fingerprint;

/// One placeholder of a compiled plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanParameter {
    /// Index of the builder condition holding the literal.
    pub condition: usize,
    /// Physical type the literal is bound as, with foreign keys already
    /// resolved to their target's key type.
    pub scalar: ScalarType,
}

/// Rendered SQL plus where each parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPlan {
    /// Statement text.
    pub sql: String,
    /// Placeholders in position order.
    pub parameters: Vec<PlanParameter>,
}

/// Two-generation cache from fingerprints to plans.
///
/// One instance lives in each [`WorkerContext`](crate::WorkerContext) and is
/// never shared.
pub struct QueryPlanCache {
    cache: GenerationalCache<Fingerprint, Arc<CachedPlan>>,
}

impl QueryPlanCache {
    /// Creates a cache.
    pub fn new(new_gen_size: usize, promote_threshold: u32) -> Self {
        Self {
            cache: GenerationalCache::new(new_gen_size, promote_threshold),
        }
    }

    /// Creates a cache from configuration.
    pub fn from_config(config: &QueryCacheConfig) -> Self {
        Self {
            cache: GenerationalCache::from_config(config),
        }
    }

    /// Looks up a plan, counting the hit towards promotion.
    pub fn get(&mut self, fingerprint: &Fingerprint) -> Option<Arc<CachedPlan>> {
        self.cache.get(fingerprint)
    }

    /// Stores a freshly compiled plan.
    pub fn put(&mut self, fingerprint: Fingerprint, plan: Arc<CachedPlan>) {
        self.cache.put(fingerprint, plan);
    }

    /// Looks up a plan, compiling and storing it on a miss.
    pub fn get_or_compile<F>(
        &mut self,
        fingerprint: &Fingerprint,
        compile: F,
    ) -> RecorderResult<Arc<CachedPlan>>
    where
        F: FnOnce() -> RecorderResult<CachedPlan>,
    {
        self.cache
            .get_or_insert_with(fingerprint, || compile().map(Arc::new))
    }

    /// Returns true if the plan is still provisional.
    pub fn in_new_generation(&self, fingerprint: &Fingerprint) -> bool {
        self.cache.in_new_generation(fingerprint)
    }

    /// Returns true if the plan has been promoted.
    pub fn in_old_generation(&self, fingerprint: &Fingerprint) -> bool {
        self.cache.in_old_generation(fingerprint)
    }

    /// Returns the number of provisional plans.
    pub fn new_gen_len(&self) -> usize {
        self.cache.new_gen_len()
    }

    /// Returns the number of promoted plans.
    pub fn old_gen_len(&self) -> usize {
        self.cache.old_gen_len()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> &CacheStats {
        self.cache.stats()
    }
}
