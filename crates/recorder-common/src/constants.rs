//! Defaults shared across Recorder crates.

/// Default capacity of the new generation of a per-worker query cache.
pub const DEFAULT_NEW_GEN_SIZE: usize = 30;

/// Default number of lookups after which a new-generation entry is promoted
/// to the old generation.
pub const DEFAULT_PROMOTE_THRESHOLD: u32 = 10;

/// Placeholder used by dialects with positional `?` parameters.
pub const POSITIONAL_PLACEHOLDER: &str = "?";

/// Index of the first column in a row cursor and of the first parameter of
/// a statement. Drivers count from one.
pub const FIRST_POSITION: usize = 1;
