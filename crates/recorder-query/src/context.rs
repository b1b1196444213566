//! Per-worker query state.

use std::sync::Arc;

use recorder_codec::CodecView;
use recorder_common::{RecorderError, RecorderResult};
use recorder_schema::{Record, SchemaView};

use crate::engine::Engine;
use crate::plan::QueryPlanCache;
use crate::select::SelectBuilder;

/// State owned by one worker thread.
///
/// Holds the worker's query plan cache and its local views of the shared
/// table and codec caches. A context is `Send` but is meant to stay with the
/// worker that created it; nothing in it is shared except through the
/// engine's `Arc`s.
pub struct WorkerContext {
    engine: Arc<Engine>,
    pub(crate) plans: QueryPlanCache,
    pub(crate) tables: SchemaView,
    pub(crate) codecs: CodecView,
}

impl WorkerContext {
    pub(crate) fn new(engine: Arc<Engine>) -> Self {
        Self {
            plans: QueryPlanCache::from_config(&engine.config.query_cache),
            tables: SchemaView::new(Arc::clone(&engine.catalog)),
            codecs: CodecView::new(Arc::clone(&engine.codecs)),
            engine,
        }
    }

    pub(crate) fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Starts a SELECT for records of type `R`.
    ///
    /// Registers `R` with the catalog and acquires the connection the query
    /// will run on. The connection is released when the builder is executed
    /// or dropped.
    pub fn select<R: Record>(&mut self) -> RecorderResult<SelectBuilder<'_, R>> {
        self.engine.catalog.register::<R>()?;
        let connection = self
            .engine
            .data_source
            .connection()
            .map_err(RecorderError::execution)?;
        Ok(SelectBuilder::new(self, connection))
    }

    /// Returns this worker's plan cache.
    pub fn plans(&self) -> &QueryPlanCache {
        &self.plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder_common::{DriverError, RecorderConfig};

    use crate::adapter::AnsiAdapter;
    use crate::driver::{Connection, DataSource};
    use crate::engine::Recorder;

    struct Unavailable;

    impl DataSource for Unavailable {
        fn connection(&self) -> Result<Box<dyn Connection>, DriverError> {
            Err("database is down".into())
        }
    }

    recorder_schema::record! {
        pub struct Note {
            pub id: recorder_schema::PrimaryKey<i64>,
            pub text: String,
        }
    }

    #[test]
    fn test_plan_cache_follows_config() {
        let mut config = RecorderConfig::default();
        config.query_cache.new_gen_size = 3;
        let recorder =
            Recorder::new(Arc::new(Unavailable), Arc::new(AnsiAdapter::new()), config).unwrap();
        let worker = recorder.worker();
        assert_eq!(worker.plans().new_gen_len(), 0);
        assert_eq!(worker.plans().old_gen_len(), 0);
    }

    #[test]
    fn test_select_surfaces_connection_failure() {
        let recorder = Recorder::new(
            Arc::new(Unavailable),
            Arc::new(AnsiAdapter::new()),
            RecorderConfig::default(),
        )
        .unwrap();
        let mut worker = recorder.worker();

        let err = worker.select::<Note>().err().unwrap();
        assert!(matches!(err, RecorderError::Execution { .. }));
        assert!(err.to_string().contains("database is down"));
        // The record type is still registered
        assert!(recorder.catalog().is_registered(&Note::record_type()));
    }
}
