//! Caching utilities for Recorder.
//!
//! This crate provides the two cache shapes the query path relies on:
//!
//! - **Generational Cache**: Single-owner cache with a bounded new
//!   generation and a permanent old generation, used for compiled queries
//! - **Shared Cache**: Concurrent memoization map for derived tables and
//!   generated codecs, with per-worker local views
//!
//! # Example
//!
//! ```rust
//! use recorder_cache::GenerationalCache;
//!
//! let mut cache = GenerationalCache::new(30, 10);
//! cache.put("SELECT id FROM Users", 1);
//! assert_eq!(cache.get(&"SELECT id FROM Users"), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod generational;
pub mod shared;
pub mod stats;

pub use generational::GenerationalCache;
pub use shared::{LocalCache, SharedCache};
pub use stats::{CacheCounters, CacheStats};
