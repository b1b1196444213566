//! # recorder-schema
//!
//! Record declarations and table derivation for Recorder.
//!
//! This crate turns record types into tables:
//!
//! - **Records**: the [`record!`] macro declares a struct, its live
//!   [`RecordDescriptor`], and one [`ColumnRef`] constant per field
//! - **Field types**: [`FieldType`] with scalar, opaque, and wrapper variants
//!   ([`PrimaryKey`], [`ForeignKey`], `Option`)
//! - **Tables**: [`Table`] derivation from live descriptors or serialized
//!   [`TypeDescription`]s, both yielding the same result
//! - **Catalog**: [`SchemaCatalog`], the process-wide registry and table cache
//!
//! ## Example
//!
//! ```rust
//! use recorder_schema::{record, PrimaryKey, SchemaCatalog};
//!
//! record! {
//!     pub struct User as "Users" {
//!         pub id: PrimaryKey<i64>,
//!         pub name: String,
//!         pub age: i32,
//!     }
//! }
//!
//! let catalog = SchemaCatalog::new();
//! let table = catalog.table_of::<User>().unwrap();
//! assert_eq!(table.name, "Users");
//! assert_eq!(User::age.resolve().name, "age");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod column_ref;
pub mod description;
pub mod field;
pub mod record;
pub mod table;
pub mod types;

pub use catalog::{SchemaCatalog, SchemaSource, SchemaView};
pub use column_ref::{ColumnHandle, ColumnKey, ColumnRef, ResolvedColumn};
pub use description::{FieldDescription, TypeDescription};
pub use field::{Field, ForeignKey, Opaque, PrimaryKey};
pub use record::{
    DescriptorFn, FieldAnnotations, FieldDescriptor, Record, RecordDescriptor, RecordTypeId,
};
pub use table::{Column, Constraint, Table};
pub use types::{resolve_physical, FieldType, PhysicalType, ScalarType, Wrapper};

// Used by `record!` expansions.
pub use recorder_common::{RecorderError, RecorderResult, Value};
