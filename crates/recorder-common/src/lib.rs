//! # recorder-common
//!
//! Common types, errors, and configuration for Recorder.
//!
//! This crate provides the foundational pieces shared by every Recorder
//! component:
//!
//! - **Values**: the dynamic [`Value`] exchanged with drivers, including
//!   opaque driver-native objects
//! - **Errors**: unified error handling with [`RecorderError`]
//! - **Config**: [`RecorderConfig`] and its TOML loader
//! - **Constants**: defaults shared across crates
//!
//! ## Example
//!
//! ```rust
//! use recorder_common::{RecorderConfig, RecorderResult, Value};
//!
//! fn example() -> RecorderResult<()> {
//!     let config = RecorderConfig::default();
//!     config.validate()?;
//!     let value = Value::from("Alice");
//!     assert_eq!(value.kind(), "text");
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod constants;
pub mod error;
pub mod value;

// Re-export commonly used items at the crate root
pub use config::{QueryCacheConfig, RecorderConfig};
pub use constants::*;
pub use error::{DriverError, ErrorCode, RecorderError, RecorderResult};
pub use value::{OpaqueType, OpaqueValue, Value};
