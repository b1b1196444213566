//! Codec generation.

use recorder_common::{RecorderError, RecorderResult};
use recorder_schema::{resolve_physical, Record, SchemaSource};
use tracing::debug;

use crate::codec::{Codec, ColumnCodec};

/// Builds codecs from derived tables.
pub struct CodecGenerator;

impl CodecGenerator {
    /// Generates the codec of a record type.
    ///
    /// The table comes from `source`, so it may have been derived from a
    /// serialized description. Every field of the live descriptor must line
    /// up with a column of that table, by position, name, and type.
    pub fn generate<R: Record>(source: &dyn SchemaSource) -> RecorderResult<Codec<R>> {
        let descriptor = R::descriptor();
        let record = descriptor.type_id.to_string();
        let table = source.table(&descriptor.type_id)?;

        if table.columns.len() != descriptor.fields.len() {
            return Err(RecorderError::codec(
                record,
                format!(
                    "record declares {} fields but table '{}' has {} columns",
                    descriptor.fields.len(),
                    table.name,
                    table.columns.len()
                ),
            ));
        }

        let mut columns = Vec::with_capacity(table.columns.len());
        for (field, column) in descriptor.fields.iter().zip(&table.columns) {
            if field.name != column.name {
                return Err(RecorderError::codec(
                    record,
                    format!("field '{}' does not match column '{}'", field.name, column.name),
                ));
            }
            if field.field_type != column.field_type {
                return Err(RecorderError::codec(
                    record,
                    format!(
                        "field '{}' is {} but column is {}",
                        field.name, field.field_type, column.field_type
                    ),
                ));
            }

            let physical = resolve_physical(&column.field_type, source)?;
            columns.push(ColumnCodec {
                name: column.name.clone(),
                scalar: physical.scalar,
                nullable: physical.nullable || column.is_nullable(),
                generated: column.is_generated(),
            });
        }

        debug!(record = %descriptor.type_id, columns = columns.len(), "generated codec");
        Ok(Codec::new(table, columns))
    }
}
