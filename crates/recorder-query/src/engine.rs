//! The engine facade.

use std::sync::Arc;

use recorder_codec::CodecCache;
use recorder_common::{RecorderConfig, RecorderError, RecorderResult};
use recorder_schema::{Record, SchemaCatalog};
use tracing::{debug, info};

use crate::adapter::SqlAdapter;
use crate::context::WorkerContext;
use crate::driver::DataSource;

/// Process-wide state shared by every worker.
pub(crate) struct Engine {
    pub(crate) data_source: Arc<dyn DataSource>,
    pub(crate) adapter: Arc<dyn SqlAdapter>,
    pub(crate) catalog: Arc<SchemaCatalog>,
    pub(crate) codecs: Arc<CodecCache>,
    pub(crate) config: RecorderConfig,
}

/// Entry point: a data source, a dialect, and the shared caches.
///
/// Cloning is cheap; clones share the catalog and codec cache. Each worker
/// thread takes its own [`WorkerContext`] from [`Recorder::worker`].
#[derive(Clone)]
pub struct Recorder {
    engine: Arc<Engine>,
}

impl Recorder {
    /// Creates an engine after validating `config`.
    pub fn new(
        data_source: Arc<dyn DataSource>,
        adapter: Arc<dyn SqlAdapter>,
        config: RecorderConfig,
    ) -> RecorderResult<Self> {
        config.validate()?;
        info!(
            adapter = adapter.name(),
            new_gen_size = config.query_cache.new_gen_size,
            promote_threshold = config.query_cache.promote_threshold,
            "recorder initialized"
        );
        Ok(Self {
            engine: Arc::new(Engine {
                data_source,
                adapter,
                catalog: Arc::new(SchemaCatalog::new()),
                codecs: Arc::new(CodecCache::new()),
                config,
            }),
        })
    }

    /// Creates the state for one worker thread.
    pub fn worker(&self) -> WorkerContext {
        WorkerContext::new(Arc::clone(&self.engine))
    }

    /// Registers `R` and the targets of its foreign keys.
    pub fn register<R: Record>(&self) -> RecorderResult<()> {
        self.engine.catalog.register::<R>()
    }

    /// Renders the CREATE TABLE statement for `R`.
    pub fn create_table_sql<R: Record>(&self) -> RecorderResult<String> {
        let table = self.engine.catalog.table_of::<R>()?;
        self.engine
            .adapter
            .create_table(&table, self.engine.catalog.as_ref())
    }

    /// Creates the table of `R`.
    pub fn create_table<R: Record>(&self) -> RecorderResult<()> {
        let sql = self.create_table_sql::<R>()?;
        let mut connection = self
            .engine
            .data_source
            .connection()
            .map_err(RecorderError::execution)?;
        connection.execute(&sql).map_err(RecorderError::execution)?;
        debug!(record = %R::record_type(), "created table");
        Ok(())
    }

    /// Inserts `record`, returning the number of affected rows.
    ///
    /// Columns the database generates are left out of the statement.
    pub fn insert<R: Record>(&self, record: &R) -> RecorderResult<u64> {
        let table = self.engine.catalog.table_of::<R>()?;
        let codec = self.engine.codecs.get::<R>(self.engine.catalog.as_ref())?;
        let sql = self.engine.adapter.insert(&table);

        let mut connection = self
            .engine
            .data_source
            .connection()
            .map_err(RecorderError::execution)?;
        let mut statement = connection.prepare(&sql).map_err(RecorderError::execution)?;
        codec.encode_insert(&mut *statement, record)?;
        let affected = statement
            .execute_update()
            .map_err(RecorderError::execution)?;
        Ok(affected)
    }

    /// Returns the schema catalog.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.engine.catalog
    }

    /// Returns the codec cache.
    pub fn codecs(&self) -> &Arc<CodecCache> {
        &self.engine.codecs
    }

    /// Returns the SQL dialect.
    pub fn adapter(&self) -> &Arc<dyn SqlAdapter> {
        &self.engine.adapter
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RecorderConfig {
        &self.engine.config
    }
}
