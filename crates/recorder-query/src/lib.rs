//! # recorder-query
//!
//! Queries, plans, and the engine facade for Recorder.
//!
//! - **Engine**: [`Recorder`] ties a [`DataSource`], a [`SqlAdapter`], and
//!   the shared catalog and codec caches together
//! - **Workers**: [`WorkerContext`] holds one thread's plan cache and local
//!   cache views; every query runs through one
//! - **Builder**: [`SelectBuilder`] assembles a SELECT and its
//!   [`Fingerprint`]; structurally equal queries share one [`CachedPlan`]
//! - **Dialects**: [`AnsiAdapter`] (`?` placeholders) and
//!   [`PostgresAdapter`] (`$n` placeholders)
//!
//! ## Example
//!
//! ```rust,ignore
//! use recorder_query::{record, AnsiAdapter, PrimaryKey, Recorder, RecorderConfig};
//!
//! record! {
//!     pub struct User as "Users" {
//!         pub id: PrimaryKey<i64>,
//!         pub name: String,
//!         pub age: i32,
//!     }
//! }
//!
//! let recorder = Recorder::new(data_source, Arc::new(AnsiAdapter::new()), RecorderConfig::default())?;
//! let mut worker = recorder.worker();
//! let alice = worker.select::<User>()?.where_(User::name).eq("Alice").first()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapter;
pub mod context;
pub mod driver;
pub mod engine;
pub mod fingerprint;
pub mod plan;
pub mod select;

pub use adapter::{
    AnsiAdapter, ConditionSpec, OperandSpec, Operator, Order, PostgresAdapter, RenderedSql,
    SelectSpec, SqlAdapter,
};
pub use context::WorkerContext;
pub use driver::{Connection, DataSource, Statement};
pub use engine::Recorder;
pub use fingerprint::{ConditionShape, Fingerprint, OperandShape, Source};
pub use plan::{CachedPlan, PlanParameter, QueryPlanCache};
pub use select::{ConditionBuilder, SelectBuilder};

pub use recorder_cache::{CacheCounters, CacheStats};
pub use recorder_codec::{RowCursor, StatementSink};
pub use recorder_common::{
    DriverError, OpaqueType, OpaqueValue, RecorderConfig, RecorderError, RecorderResult, Value,
};
pub use recorder_schema::{
    record, ColumnRef, Field, ForeignKey, Opaque, PrimaryKey, Record, RecordTypeId, SchemaCatalog,
};
