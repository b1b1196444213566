//! Error handling for Recorder.
//!
//! This module provides a unified error type and result alias used
//! across all Recorder components.

mod recorder;

pub use recorder::{DriverError, ErrorCode, RecorderError};

/// Result type alias for Recorder operations.
pub type RecorderResult<T> = std::result::Result<T, RecorderError>;
