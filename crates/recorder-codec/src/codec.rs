//! Row codecs.
//!
//! A [`Codec`] converts between one record type and the columns of its
//! table. Wrapper types are resolved once, when the codec is generated:
//! each column keeps only its physical scalar type and null handling, so
//! decoding and encoding a row is a straight walk over the columns.

use std::marker::PhantomData;
use std::sync::Arc;

use recorder_common::{RecorderError, RecorderResult, Value, FIRST_POSITION};
use recorder_schema::{Record, RecordTypeId, ScalarType, Table};

use crate::driver::{bind_value, read_scalar, RowCursor, StatementSink};

/// Physical access plan for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCodec {
    /// Column name.
    pub name: String,
    /// Driver-level value type.
    pub scalar: ScalarType,
    /// Column may hold NULL.
    pub nullable: bool,
    /// Database assigns the value on insert.
    pub generated: bool,
}

impl ColumnCodec {
    /// Reads the column at a 1-based position.
    pub fn read<C>(&self, cursor: &C, position: usize) -> RecorderResult<Value>
    where
        C: RowCursor + ?Sized,
    {
        if self.nullable && cursor.is_null(position).map_err(RecorderError::execution)? {
            return Ok(Value::Null);
        }
        read_scalar(cursor, position, &self.scalar)
    }

    /// Binds a value to a 1-based position.
    pub fn write<S>(&self, sink: &mut S, position: usize, value: &Value) -> RecorderResult<()>
    where
        S: StatementSink + ?Sized,
    {
        if value.is_null() && !self.nullable && !self.generated {
            return Err(RecorderError::type_mismatch(
                format!("{} for column '{}'", self.scalar, self.name),
                "null",
            ));
        }
        bind_value(sink, position, &self.scalar, value)
    }
}

/// Generated converter between records of type `R` and table rows.
pub struct Codec<R> {
    record: RecordTypeId,
    table: Arc<Table>,
    columns: Vec<ColumnCodec>,
    _record: PhantomData<fn() -> R>,
}

impl<R> std::fmt::Debug for Codec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("record", &self.record)
            .field("table", &self.table)
            .field("columns", &self.columns)
            .finish()
    }
}

impl<R: Record> Codec<R> {
    pub(crate) fn new(table: Arc<Table>, columns: Vec<ColumnCodec>) -> Self {
        Self {
            record: R::record_type(),
            table,
            columns,
            _record: PhantomData,
        }
    }

    /// Decodes the cursor's current row, reading columns from position 1.
    ///
    /// Each column is read straight into its field; no intermediate row is
    /// built.
    pub fn decode<C>(&self, cursor: &C) -> RecorderResult<R>
    where
        C: RowCursor + ?Sized,
    {
        R::read_fields(|index| {
            let column = self.columns.get(index).ok_or_else(|| {
                RecorderError::codec(
                    self.record.to_string(),
                    format!("no column plan for field {}", index),
                )
            })?;
            column.read(cursor, FIRST_POSITION + index)
        })
    }

    /// Binds every column of a record, starting at position 1.
    pub fn encode<S>(&self, sink: &mut S, record: &R) -> RecorderResult<()>
    where
        S: StatementSink + ?Sized,
    {
        let values = self.values_of(record)?;
        for (i, (column, value)) in self.columns.iter().zip(&values).enumerate() {
            column.write(sink, FIRST_POSITION + i, value)?;
        }
        Ok(())
    }

    /// Binds the columns an insert supplies, skipping generated ones.
    ///
    /// Returns the number of bound parameters.
    pub fn encode_insert<S>(&self, sink: &mut S, record: &R) -> RecorderResult<usize>
    where
        S: StatementSink + ?Sized,
    {
        let values = self.values_of(record)?;
        let mut position = FIRST_POSITION;
        for (column, value) in self.columns.iter().zip(&values) {
            if column.generated {
                continue;
            }
            column.write(sink, position, value)?;
            position += 1;
        }
        Ok(position - FIRST_POSITION)
    }

    fn values_of(&self, record: &R) -> RecorderResult<Vec<Value>> {
        let values = record.to_values();
        if values.len() != self.columns.len() {
            return Err(RecorderError::codec(
                self.record.to_string(),
                format!(
                    "record produced {} values for {} columns",
                    values.len(),
                    self.columns.len()
                ),
            ));
        }
        Ok(values)
    }

    /// Returns the record type.
    pub fn record_type(&self) -> &RecordTypeId {
        &self.record
    }

    /// Returns the table the codec was generated from.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// Returns the column plans in position order.
    pub fn columns(&self) -> &[ColumnCodec] {
        &self.columns
    }
}
