//! Recorder error types.
//!
//! Provides the error type shared by schema derivation, codec generation,
//! query building, and execution.

use std::fmt;
use thiserror::Error;

/// Error reported by a driver collaborator (connection, statement, cursor).
///
/// Recorder never inspects these; they are carried to the caller unchanged.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error codes for categorizing errors.
///
/// These codes can be used for programmatic error handling and
/// are stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // General errors (0x0000 - 0x00FF)
    /// Internal error (bug).
    Internal = 0x0001,
    /// I/O error while loading configuration.
    Io = 0x0002,

    // Schema errors (0x0100 - 0x01FF)
    /// More than one primary key in a record.
    MultiplePrimaryKeys = 0x0100,
    /// Field type cannot be mapped to a column.
    UnsupportedType = 0x0101,
    /// Table name cannot be determined.
    AmbiguousTableName = 0x0102,
    /// Two fields map to the same column.
    DuplicateColumn = 0x0103,
    /// Foreign key target has no primary key.
    MissingPrimaryKey = 0x0104,
    /// Record type is not known to the schema source.
    UnknownRecord = 0x0105,
    /// Primary key declared nullable.
    NullablePrimaryKey = 0x0106,
    /// Two record types share one identifier.
    DuplicateRecordType = 0x0107,
    /// Column reference does not match any field of its record.
    UnknownColumn = 0x0108,

    // Builder errors (0x0200 - 0x02FF)
    /// Query builder used in an invalid order.
    BuilderState = 0x0200,

    // Codec errors (0x0300 - 0x03FF)
    /// Codec does not agree with its schema.
    CodecGeneration = 0x0300,
    /// Value has the wrong type for its column.
    TypeMismatch = 0x0301,
    /// Fewer values than fields while building a record.
    MissingValue = 0x0302,

    // Execution errors (0x0400 - 0x04FF)
    /// Driver reported an error.
    Execution = 0x0400,

    // Configuration errors (0x0500 - 0x05FF)
    /// Configuration value out of range.
    InvalidConfig = 0x0500,
    /// Configuration file could not be parsed.
    ConfigParse = 0x0501,
}

impl ErrorCode {
    /// Returns the numeric code.
    #[inline]
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match (*self as u16) >> 8 {
            0x00 => "General",
            0x01 => "Schema",
            0x02 => "Builder",
            0x03 => "Codec",
            0x04 => "Execution",
            0x05 => "Config",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The main error type for Recorder.
///
/// Schema, builder, and codec errors describe programming or declaration
/// mistakes and are never retried. Execution errors come straight from the
/// driver.
///
/// # Example
///
/// ```rust
/// use recorder_common::error::{ErrorCode, RecorderError, RecorderResult};
///
/// fn derive() -> RecorderResult<()> {
///     Err(RecorderError::MultiplePrimaryKeys {
///         record: "app::User".to_string(),
///         columns: vec!["id".to_string(), "uuid".to_string()],
///     })
/// }
///
/// assert_eq!(derive().unwrap_err().code(), ErrorCode::MultiplePrimaryKeys);
/// ```
#[derive(Debug, Error)]
pub enum RecorderError {
    // ==========================================================================
    // General Errors
    // ==========================================================================
    /// Internal error - this indicates a bug.
    #[error("internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },

    /// I/O error while reading configuration.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    /// A record declares more than one primary key.
    #[error("record '{record}' declares more than one primary key: {}", columns.join(", "))]
    MultiplePrimaryKeys {
        /// The offending record type.
        record: String,
        /// Every column marked as primary key.
        columns: Vec<String>,
    },

    /// A field type cannot be represented as a column.
    #[error("unsupported type '{type_name}' for field '{field}': {reason}")]
    UnsupportedType {
        /// The field carrying the type.
        field: String,
        /// Textual form of the type.
        type_name: String,
        /// Why the type was rejected.
        reason: String,
    },

    /// The table name of a record cannot be determined.
    #[error("ambiguous table name for record '{record}': {reason}")]
    AmbiguousTableName {
        /// The offending record type.
        record: String,
        /// Why the name is ambiguous.
        reason: String,
    },

    /// Two fields share a column name.
    #[error("column '{column}' declared twice in record '{record}'")]
    DuplicateColumn {
        /// The offending record type.
        record: String,
        /// The duplicated column.
        column: String,
    },

    /// A foreign key refers to a table without a primary key.
    #[error("record '{record}' has no primary key to refer to")]
    MissingPrimaryKey {
        /// The foreign key target.
        record: String,
    },

    /// The schema source does not know a record type.
    #[error("record type '{record}' is not registered")]
    UnknownRecord {
        /// The unknown record type.
        record: String,
    },

    /// A primary key column was declared nullable.
    #[error("primary key '{column}' of record '{record}' cannot be nullable")]
    NullablePrimaryKey {
        /// The offending record type.
        record: String,
        /// The primary key column.
        column: String,
    },

    /// Two distinct record types were registered under one identifier.
    #[error("record identifier '{record}' is already taken by another type")]
    DuplicateRecordType {
        /// The contested identifier.
        record: String,
    },

    /// A column reference names no field of its record.
    #[error("record '{record}' has no field '{column}' at position {index}")]
    UnknownColumn {
        /// The owning record type.
        record: String,
        /// The referenced column name.
        column: String,
        /// The referenced field position.
        index: usize,
    },

    // ==========================================================================
    // Builder Errors
    // ==========================================================================
    /// A query builder was used in an invalid order.
    #[error("invalid builder state: {message}")]
    BuilderState {
        /// Error message.
        message: String,
    },

    // ==========================================================================
    // Codec Errors
    // ==========================================================================
    /// A codec could not be generated for a record.
    #[error("codec generation failed for '{record}': {message}")]
    CodecGeneration {
        /// The record type.
        record: String,
        /// Error message.
        message: String,
    },

    /// A value does not match its column type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual type.
        actual: String,
    },

    /// A record was built from fewer values than it has fields.
    #[error("missing value for field '{field}'")]
    MissingValue {
        /// The field without a value.
        field: String,
    },

    // ==========================================================================
    // Execution Errors
    // ==========================================================================
    /// Driver-reported failure (connectivity, constraint violation, timeout).
    #[error("execution failed: {source}")]
    Execution {
        /// The driver error, unchanged.
        #[source]
        source: DriverError,
    },

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Configuration text could not be parsed.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// The underlying TOML error.
        #[from]
        source: toml::de::Error,
    },
}

impl RecorderError {
    /// Returns the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Internal { .. } => ErrorCode::Internal,
            Self::Io { .. } => ErrorCode::Io,
            Self::MultiplePrimaryKeys { .. } => ErrorCode::MultiplePrimaryKeys,
            Self::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            Self::AmbiguousTableName { .. } => ErrorCode::AmbiguousTableName,
            Self::DuplicateColumn { .. } => ErrorCode::DuplicateColumn,
            Self::MissingPrimaryKey { .. } => ErrorCode::MissingPrimaryKey,
            Self::UnknownRecord { .. } => ErrorCode::UnknownRecord,
            Self::NullablePrimaryKey { .. } => ErrorCode::NullablePrimaryKey,
            Self::DuplicateRecordType { .. } => ErrorCode::DuplicateRecordType,
            Self::UnknownColumn { .. } => ErrorCode::UnknownColumn,
            Self::BuilderState { .. } => ErrorCode::BuilderState,
            Self::CodecGeneration { .. } => ErrorCode::CodecGeneration,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::MissingValue { .. } => ErrorCode::MissingValue,
            Self::Execution { .. } => ErrorCode::Execution,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::ConfigParse { .. } => ErrorCode::ConfigParse,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// The core defines no retry policy; driver errors are left to the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        false
    }

    /// Returns true if this error was raised while deriving a schema.
    #[must_use]
    pub fn is_schema_error(&self) -> bool {
        self.code().category() == "Schema"
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a builder state error.
    #[must_use]
    pub fn builder_state(message: impl Into<String>) -> Self {
        Self::BuilderState {
            message: message.into(),
        }
    }

    /// Creates a codec generation error.
    #[must_use]
    pub fn codec(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CodecGeneration {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Wraps a driver error.
    #[must_use]
    pub fn execution(source: impl Into<DriverError>) -> Self {
        Self::Execution {
            source: source.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
