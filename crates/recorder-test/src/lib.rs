//! # recorder-test
//!
//! Integration tests for Recorder.
//!
//! This crate contains:
//! - An in-memory driver that scripts result rows and records every
//!   statement it sees
//! - Shared record fixtures
//! - End-to-end, property, and concurrency tests under `tests/`

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Shared record declarations
pub mod fixtures;

/// In-memory driver
pub mod mock;

pub use mock::{ExecutedStatement, MockDatabase, ResourceCounts, StatementKind};
