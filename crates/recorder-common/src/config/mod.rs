//! Configuration for Recorder.
//!
//! This module provides configuration structures for the engine and its
//! per-worker caches.

mod recorder;

pub use recorder::{QueryCacheConfig, RecorderConfig};
