//! Row cursor and statement sink collaborators.
//!
//! Drivers implement these two traits; codecs only ever talk to them.
//! Positions are 1-based, as in SQL parameter numbering.

use recorder_common::{DriverError, OpaqueType, OpaqueValue, RecorderError, RecorderResult, Value};
use recorder_schema::ScalarType;

/// A forward-only cursor over result rows.
pub trait RowCursor {
    /// Moves to the next row. Returns false once rows are exhausted.
    fn advance(&mut self) -> Result<bool, DriverError>;

    /// Returns true if the column holds NULL.
    fn is_null(&self, index: usize) -> Result<bool, DriverError>;

    /// Reads a boolean column.
    fn get_bool(&self, index: usize) -> Result<bool, DriverError>;

    /// Reads an 8-bit integer column.
    fn get_byte(&self, index: usize) -> Result<i8, DriverError>;

    /// Reads a 16-bit integer column.
    fn get_short(&self, index: usize) -> Result<i16, DriverError>;

    /// Reads a 32-bit integer column.
    fn get_int(&self, index: usize) -> Result<i32, DriverError>;

    /// Reads a 64-bit integer column.
    fn get_long(&self, index: usize) -> Result<i64, DriverError>;

    /// Reads a 32-bit float column.
    fn get_float(&self, index: usize) -> Result<f32, DriverError>;

    /// Reads a 64-bit float column.
    fn get_double(&self, index: usize) -> Result<f64, DriverError>;

    /// Reads a text column.
    fn get_text(&self, index: usize) -> Result<String, DriverError>;

    /// Reads a driver-native object of the given type.
    fn get_opaque(&self, index: usize, ty: &OpaqueType) -> Result<OpaqueValue, DriverError>;
}

/// Parameter slots of a prepared statement.
pub trait StatementSink {
    /// Binds NULL for a column of the given type.
    fn set_null(&mut self, index: usize, ty: &ScalarType) -> Result<(), DriverError>;

    /// Binds a boolean.
    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), DriverError>;

    /// Binds an 8-bit integer.
    fn set_byte(&mut self, index: usize, value: i8) -> Result<(), DriverError>;

    /// Binds a 16-bit integer.
    fn set_short(&mut self, index: usize, value: i16) -> Result<(), DriverError>;

    /// Binds a 32-bit integer.
    fn set_int(&mut self, index: usize, value: i32) -> Result<(), DriverError>;

    /// Binds a 64-bit integer.
    fn set_long(&mut self, index: usize, value: i64) -> Result<(), DriverError>;

    /// Binds a 32-bit float.
    fn set_float(&mut self, index: usize, value: f32) -> Result<(), DriverError>;

    /// Binds a 64-bit float.
    fn set_double(&mut self, index: usize, value: f64) -> Result<(), DriverError>;

    /// Binds text.
    fn set_text(&mut self, index: usize, value: &str) -> Result<(), DriverError>;

    /// Binds a driver-native object.
    fn set_opaque(&mut self, index: usize, value: &OpaqueValue) -> Result<(), DriverError>;
}

/// Reads one column as a value of the given scalar type.
pub fn read_scalar<C>(cursor: &C, index: usize, scalar: &ScalarType) -> RecorderResult<Value>
where
    C: RowCursor + ?Sized,
{
    let value = match scalar {
        ScalarType::Bool => cursor.get_bool(index).map(Value::Bool),
        ScalarType::Byte => cursor.get_byte(index).map(Value::Byte),
        ScalarType::Short => cursor.get_short(index).map(Value::Short),
        ScalarType::Int => cursor.get_int(index).map(Value::Int),
        ScalarType::Long => cursor.get_long(index).map(Value::Long),
        ScalarType::Float => cursor.get_float(index).map(Value::Float),
        ScalarType::Double => cursor.get_double(index).map(Value::Double),
        ScalarType::Text => cursor.get_text(index).map(Value::Text),
        ScalarType::Opaque(ty) => cursor.get_opaque(index, ty).map(Value::Opaque),
    };
    value.map_err(RecorderError::execution)
}

/// Binds a value to a parameter slot of the given scalar type.
///
/// NULL is always accepted here; whether a column may hold NULL is the
/// caller's concern.
pub fn bind_value<S>(sink: &mut S, index: usize, scalar: &ScalarType, value: &Value) -> RecorderResult<()>
where
    S: StatementSink + ?Sized,
{
    let result = match (scalar, value) {
        (_, Value::Null) => sink.set_null(index, scalar),
        (ScalarType::Bool, Value::Bool(v)) => sink.set_bool(index, *v),
        (ScalarType::Byte, Value::Byte(v)) => sink.set_byte(index, *v),
        (ScalarType::Short, Value::Short(v)) => sink.set_short(index, *v),
        (ScalarType::Int, Value::Int(v)) => sink.set_int(index, *v),
        (ScalarType::Long, Value::Long(v)) => sink.set_long(index, *v),
        (ScalarType::Float, Value::Float(v)) => sink.set_float(index, *v),
        (ScalarType::Double, Value::Double(v)) => sink.set_double(index, *v),
        (ScalarType::Text, Value::Text(v)) => sink.set_text(index, v),
        (ScalarType::Opaque(ty), Value::Opaque(v)) if v.opaque_type() == ty => {
            sink.set_opaque(index, v)
        }
        (scalar, Value::Opaque(v)) => {
            return Err(RecorderError::type_mismatch(
                scalar.to_string(),
                format!("Opaque<{}>", v.opaque_type()),
            ))
        }
        (scalar, other) => {
            return Err(RecorderError::type_mismatch(scalar.to_string(), other.kind()))
        }
    };
    result.map_err(RecorderError::execution)
}
