//! Connection collaborators.
//!
//! Recorder never pools or opens connections itself; it asks a
//! [`DataSource`] for one per operation. Connections, statements, and
//! cursors are released by dropping them, so every exit path releases
//! them exactly once.

use recorder_codec::{RowCursor, StatementSink};
use recorder_common::DriverError;

/// Hands out connections.
pub trait DataSource: Send + Sync {
    /// Acquires a connection.
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError>;
}

/// An open connection. Dropping it releases the connection.
pub trait Connection {
    /// Prepares a statement.
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError>;

    /// Executes a statement without parameters, returning the number of
    /// affected rows.
    fn execute(&mut self, sql: &str) -> Result<u64, DriverError>;
}

/// A prepared statement. Dropping it releases the statement.
pub trait Statement: StatementSink {
    /// Caps the number of rows the next query returns.
    fn set_max_rows(&mut self, max_rows: usize) -> Result<(), DriverError>;

    /// Runs the statement as a query.
    fn execute_query(&mut self) -> Result<Box<dyn RowCursor + '_>, DriverError>;

    /// Runs the statement as an update, returning the number of affected rows.
    fn execute_update(&mut self) -> Result<u64, DriverError>;
}
