//! Process-wide codec cache.
//!
//! Codecs are generated on first request and kept for the life of the
//! cache. Generation runs without any lock held; when threads race on the
//! same record type each may generate, and all of them end up with the one
//! codec that was published first.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use recorder_cache::{CacheStats, LocalCache, SharedCache};
use recorder_common::{RecorderError, RecorderResult};
use recorder_schema::{Record, RecordTypeId, SchemaSource};

use crate::codec::Codec;
use crate::generator::CodecGenerator;

type ErasedCodec = Arc<dyn Any + Send + Sync>;

/// Shared cache of generated codecs, keyed by record type.
pub struct CodecCache {
    codecs: Arc<SharedCache<RecordTypeId, ErasedCodec>>,
    generations: AtomicU64,
}

impl CodecCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            codecs: Arc::new(SharedCache::new("codecs")),
            generations: AtomicU64::new(0),
        }
    }

    /// Returns the codec of `R`, generating it on first use.
    pub fn get<R: Record>(&self, source: &dyn SchemaSource) -> RecorderResult<Arc<Codec<R>>> {
        let erased = self
            .codecs
            .get_or_try_insert_with(&R::record_type(), || self.generate::<R>(source))?;
        downcast::<R>(erased)
    }

    fn generate<R: Record>(&self, source: &dyn SchemaSource) -> RecorderResult<ErasedCodec> {
        self.generations.fetch_add(1, Ordering::Relaxed);
        let codec = CodecGenerator::generate::<R>(source)?;
        Ok(Arc::new(codec))
    }

    /// Returns how many times a codec has been generated, including
    /// generations that lost a race or failed.
    pub fn generation_count(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    /// Returns true if a codec is cached for the record type.
    pub fn contains(&self, record: &RecordTypeId) -> bool {
        self.codecs.contains(record)
    }

    /// Returns the number of cached codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns true if no codec is cached.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Returns lookup counters of the shared map. Local view hits are not
    /// counted.
    pub fn stats(&self) -> &CacheStats {
        self.codecs.stats()
    }
}

impl Default for CodecCache {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<R: Record>(erased: ErasedCodec) -> RecorderResult<Arc<Codec<R>>> {
    erased.downcast::<Codec<R>>().map_err(|_| {
        RecorderError::codec(
            R::record_type().to_string(),
            "cached codec was generated for a different type",
        )
    })
}

/// A worker's view of the codec cache.
pub struct CodecView {
    cache: Arc<CodecCache>,
    local: LocalCache<RecordTypeId, ErasedCodec>,
}

impl CodecView {
    /// Creates a view over a shared cache.
    pub fn new(cache: Arc<CodecCache>) -> Self {
        let local = LocalCache::new(Arc::clone(&cache.codecs));
        Self { cache, local }
    }

    /// Returns the codec of `R`, generating it on first use.
    pub fn get<R: Record>(&mut self, source: &dyn SchemaSource) -> RecorderResult<Arc<Codec<R>>> {
        let cache = &self.cache;
        let erased = self
            .local
            .get_or_try_insert_with(&R::record_type(), || cache.generate::<R>(source))?;
        downcast::<R>(erased)
    }

    /// Returns the shared cache behind this view.
    pub fn cache(&self) -> &Arc<CodecCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder_schema::{record, PrimaryKey, SchemaCatalog};

    record! {
        pub struct Sensor {
            pub id: PrimaryKey<i32>,
            pub kind: String,
        }
    }

    #[test]
    fn test_generated_once() {
        let catalog = SchemaCatalog::new();
        catalog.register::<Sensor>().unwrap();
        let cache = CodecCache::new();

        let a = cache.get::<Sensor>(&catalog).unwrap();
        let b = cache.get::<Sensor>(&catalog).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.generation_count(), 1);
        assert!(cache.contains(&Sensor::record_type()));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let catalog = SchemaCatalog::new();
        let cache = CodecCache::new();

        assert!(cache.get::<Sensor>(&catalog).is_err());
        assert!(cache.is_empty());

        catalog.register::<Sensor>().unwrap();
        assert!(cache.get::<Sensor>(&catalog).is_ok());
    }

    #[test]
    fn test_views_share_codecs() {
        let catalog = SchemaCatalog::new();
        catalog.register::<Sensor>().unwrap();
        let cache = Arc::new(CodecCache::new());
        let mut left = CodecView::new(Arc::clone(&cache));
        let mut right = CodecView::new(Arc::clone(&cache));

        let a = left.get::<Sensor>(&catalog).unwrap();
        let b = right.get::<Sensor>(&catalog).unwrap();
        let c = left.get::<Sensor>(&catalog).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(cache.generation_count(), 1);

        let counters = cache.stats().counters();
        assert_eq!((counters.hits, counters.misses, counters.inserts), (1, 1, 1));
    }
}
