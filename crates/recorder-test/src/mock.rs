//! A scripted, in-memory [`DataSource`].
//!
//! The mock does not parse SQL. Each query pops the next scripted result set
//! (or returns no rows), and every prepared or executed statement is logged
//! with its bound parameters. Connections, statements, and cursors count
//! their own acquisition and release so tests can check nothing leaks.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use recorder_common::{DriverError, OpaqueType, OpaqueValue, Value};
use recorder_query::{Connection, DataSource, RowCursor, Statement, StatementSink};
use recorder_schema::ScalarType;

/// How a logged statement was run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Prepared and run as a query.
    Query,
    /// Prepared and run as an update.
    Update,
    /// Run directly on the connection.
    Direct,
}

/// A statement the mock has run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// Statement text.
    pub sql: String,
    /// Bound parameters by 1-based position.
    pub parameters: BTreeMap<usize, Value>,
    /// Row cap requested before execution.
    pub max_rows: Option<usize>,
    /// How it was run.
    pub kind: StatementKind,
}

impl ExecutedStatement {
    /// Returns bound parameters in position order.
    pub fn parameter_values(&self) -> Vec<Value> {
        self.parameters.values().cloned().collect()
    }
}

/// Acquisition and release counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    /// Connections handed out.
    pub connections_opened: usize,
    /// Connections dropped.
    pub connections_released: usize,
    /// Statements prepared.
    pub statements_opened: usize,
    /// Statements dropped.
    pub statements_released: usize,
    /// Cursors opened.
    pub cursors_opened: usize,
    /// Cursors dropped.
    pub cursors_released: usize,
}

impl ResourceCounts {
    /// Returns true if everything acquired has been released.
    pub fn is_balanced(&self) -> bool {
        self.connections_opened == self.connections_released
            && self.statements_opened == self.statements_released
            && self.cursors_opened == self.cursors_released
    }
}

struct MockState {
    results: VecDeque<Vec<Vec<Value>>>,
    executed: Vec<ExecutedStatement>,
    counts: ResourceCounts,
    fail_connection: Option<String>,
    fail_prepare: Option<String>,
    fail_execute: Option<String>,
    rows_affected: u64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            results: VecDeque::new(),
            executed: Vec::new(),
            counts: ResourceCounts::default(),
            fail_connection: None,
            fail_prepare: None,
            fail_execute: None,
            rows_affected: 1,
        }
    }
}

/// In-memory database handle. Clones share state.
#[derive(Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    /// Creates an empty mock. Updates report one affected row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the rows returned by the next query.
    pub fn push_result(&self, rows: Vec<Vec<Value>>) {
        self.state.lock().results.push_back(rows);
    }

    /// Sets the count returned by updates and direct statements.
    pub fn set_rows_affected(&self, rows: u64) {
        self.state.lock().rows_affected = rows;
    }

    /// Makes the next connection request fail.
    pub fn fail_next_connection(&self, message: &str) {
        self.state.lock().fail_connection = Some(message.to_string());
    }

    /// Makes the next prepare fail.
    pub fn fail_next_prepare(&self, message: &str) {
        self.state.lock().fail_prepare = Some(message.to_string());
    }

    /// Makes the next query, update, or direct statement fail.
    pub fn fail_next_execute(&self, message: &str) {
        self.state.lock().fail_execute = Some(message.to_string());
    }

    /// Returns every statement run so far.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.state.lock().executed.clone()
    }

    /// Returns the most recent statement.
    pub fn last_statement(&self) -> Option<ExecutedStatement> {
        self.state.lock().executed.last().cloned()
    }

    /// Returns resource counts.
    pub fn counts(&self) -> ResourceCounts {
        self.state.lock().counts
    }

    /// Returns the number of queued result sets not yet consumed.
    pub fn pending_results(&self) -> usize {
        self.state.lock().results.len()
    }
}

impl DataSource for MockDatabase {
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_connection.take() {
            return Err(message.into());
        }
        state.counts.connections_opened += 1;
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl Connection for MockConnection {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_prepare.take() {
            return Err(message.into());
        }
        state.counts.statements_opened += 1;
        Ok(Box::new(MockStatement {
            state: Arc::clone(&self.state),
            sql: sql.to_string(),
            parameters: BTreeMap::new(),
            max_rows: None,
        }))
    }

    fn execute(&mut self, sql: &str) -> Result<u64, DriverError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_execute.take() {
            return Err(message.into());
        }
        state.executed.push(ExecutedStatement {
            sql: sql.to_string(),
            parameters: BTreeMap::new(),
            max_rows: None,
            kind: StatementKind::Direct,
        });
        Ok(state.rows_affected)
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.state.lock().counts.connections_released += 1;
    }
}

struct MockStatement {
    state: Arc<Mutex<MockState>>,
    sql: String,
    parameters: BTreeMap<usize, Value>,
    max_rows: Option<usize>,
}

impl MockStatement {
    fn bind(&mut self, index: usize, value: Value) -> Result<(), DriverError> {
        if index == 0 {
            return Err("parameter positions start at 1".into());
        }
        self.parameters.insert(index, value);
        Ok(())
    }

    fn log(&self, state: &mut MockState, kind: StatementKind) {
        state.executed.push(ExecutedStatement {
            sql: self.sql.clone(),
            parameters: self.parameters.clone(),
            max_rows: self.max_rows,
            kind,
        });
    }
}

impl StatementSink for MockStatement {
    fn set_null(&mut self, index: usize, _ty: &ScalarType) -> Result<(), DriverError> {
        self.bind(index, Value::Null)
    }

    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), DriverError> {
        self.bind(index, Value::Bool(value))
    }

    fn set_byte(&mut self, index: usize, value: i8) -> Result<(), DriverError> {
        self.bind(index, Value::Byte(value))
    }

    fn set_short(&mut self, index: usize, value: i16) -> Result<(), DriverError> {
        self.bind(index, Value::Short(value))
    }

    fn set_int(&mut self, index: usize, value: i32) -> Result<(), DriverError> {
        self.bind(index, Value::Int(value))
    }

    fn set_long(&mut self, index: usize, value: i64) -> Result<(), DriverError> {
        self.bind(index, Value::Long(value))
    }

    fn set_float(&mut self, index: usize, value: f32) -> Result<(), DriverError> {
        self.bind(index, Value::Float(value))
    }

    fn set_double(&mut self, index: usize, value: f64) -> Result<(), DriverError> {
        self.bind(index, Value::Double(value))
    }

    fn set_text(&mut self, index: usize, value: &str) -> Result<(), DriverError> {
        self.bind(index, Value::Text(value.to_string()))
    }

    fn set_opaque(&mut self, index: usize, value: &OpaqueValue) -> Result<(), DriverError> {
        self.bind(index, Value::Opaque(value.clone()))
    }
}

impl Statement for MockStatement {
    fn set_max_rows(&mut self, max_rows: usize) -> Result<(), DriverError> {
        self.max_rows = Some(max_rows);
        Ok(())
    }

    fn execute_query(&mut self) -> Result<Box<dyn RowCursor + '_>, DriverError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_execute.take() {
            return Err(message.into());
        }
        self.log(&mut state, StatementKind::Query);
        let mut rows = state.results.pop_front().unwrap_or_default();
        if let Some(max_rows) = self.max_rows {
            rows.truncate(max_rows);
        }
        state.counts.cursors_opened += 1;
        Ok(Box::new(MockCursor {
            state: Arc::clone(&self.state),
            rows,
            current: None,
        }))
    }

    fn execute_update(&mut self) -> Result<u64, DriverError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_execute.take() {
            return Err(message.into());
        }
        self.log(&mut state, StatementKind::Update);
        Ok(state.rows_affected)
    }
}

impl Drop for MockStatement {
    fn drop(&mut self) {
        self.state.lock().counts.statements_released += 1;
    }
}

struct MockCursor {
    state: Arc<Mutex<MockState>>,
    rows: Vec<Vec<Value>>,
    current: Option<usize>,
}

impl MockCursor {
    fn at(&self, index: usize) -> Result<&Value, DriverError> {
        let row = self
            .current
            .and_then(|r| self.rows.get(r))
            .ok_or("cursor is not positioned on a row")?;
        index
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .ok_or_else(|| format!("no column at position {}", index).into())
    }
}

macro_rules! getter {
    ($name:ident, $ty:ty, $variant:ident) => {
        fn $name(&self, index: usize) -> Result<$ty, DriverError> {
            match self.at(index)? {
                Value::$variant(v) => Ok(v.clone()),
                other => Err(format!(
                    "column {} holds {}, not {}",
                    index,
                    other.kind(),
                    stringify!($variant)
                )
                .into()),
            }
        }
    };
}

impl RowCursor for MockCursor {
    fn advance(&mut self) -> Result<bool, DriverError> {
        let next = self.current.map_or(0, |r| r + 1);
        self.current = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
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

    fn get_opaque(&self, index: usize, ty: &OpaqueType) -> Result<OpaqueValue, DriverError> {
        match self.at(index)? {
            Value::Opaque(v) if v.opaque_type() == ty => Ok(v.clone()),
            other => Err(format!("column {} holds {}, not {}", index, other.kind(), ty).into()),
        }
    }
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.state.lock().counts.cursors_released += 1;
    }
}
