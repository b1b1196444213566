//! In-memory cursor and sink for unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use recorder_common::{DriverError, OpaqueType, OpaqueValue, Value};
use recorder_schema::ScalarType;

use crate::driver::{RowCursor, StatementSink};

/// Records every bound parameter.
#[derive(Debug, Default)]
pub struct VecSink {
    pub bound: BTreeMap<usize, Value>,
}

impl VecSink {
    /// Returns bound values in position order.
    pub fn values(&self) -> Vec<Value> {
        self.bound.values().cloned().collect()
    }
}

impl StatementSink for VecSink {
    fn set_null(&mut self, index: usize, _ty: &ScalarType) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Null);
        Ok(())
    }

    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Bool(value));
        Ok(())
    }

    fn set_byte(&mut self, index: usize, value: i8) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Byte(value));
        Ok(())
    }

    fn set_short(&mut self, index: usize, value: i16) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Short(value));
        Ok(())
    }

    fn set_int(&mut self, index: usize, value: i32) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Int(value));
        Ok(())
    }

    fn set_long(&mut self, index: usize, value: i64) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Long(value));
        Ok(())
    }

    fn set_float(&mut self, index: usize, value: f32) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Float(value));
        Ok(())
    }

    fn set_double(&mut self, index: usize, value: f64) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Double(value));
        Ok(())
    }

    fn set_text(&mut self, index: usize, value: &str) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Text(value.to_string()));
        Ok(())
    }

    fn set_opaque(&mut self, index: usize, value: &OpaqueValue) -> Result<(), DriverError> {
        self.bound.insert(index, Value::Opaque(value.clone()));
        Ok(())
    }
}

/// A single row of values, positioned on the row from the start.
///
/// Remembers the positions read, in order.
pub struct VecRow {
    values: Vec<Value>,
    pub reads: RefCell<Vec<usize>>,
}

impl VecRow {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            reads: RefCell::new(Vec::new()),
        }
    }

    fn at(&self, index: usize) -> Result<&Value, DriverError> {
        self.reads.borrow_mut().push(index);
        index
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| format!("no column at position {}", index).into())
    }
}

macro_rules! getter {
    ($name:ident, $ty:ty, $variant:ident) => {
        fn $name(&self, index: usize) -> Result<$ty, DriverError> {
            match self.at(index)? {
                Value::$variant(v) => Ok(v.clone()),
                other => Err(format!("column {} holds {}", index, other.kind()).into()),
            }
        }
    };
}

impl RowCursor for VecRow {
    fn advance(&mut self) -> Result<bool, DriverError> {
        Ok(true)
    }

    fn is_null(&self, index: usize) -> Result<bool, DriverError> {
        Ok(self.at(index)?.is_null())
    }

    getter!(get_bool, bool, Bool);
    getter!(get_byte, i8, Byte);
    getter!(get_short, i16, Short);
    getter!(get_int, i32, Int);
    getter!(get_long, i64, Long);
    getter!(get_float, f32, Float);
    getter!(get_double, f64, Double);
    getter!(get_text, String, Text);

    fn get_opaque(&self, index: usize, _ty: &OpaqueType) -> Result<OpaqueValue, DriverError> {
        match self.at(index)? {
            Value::Opaque(v) => Ok(v.clone()),
            other => Err(format!("column {} holds {}", index, other.kind()).into()),
        }
    }
}
