//! # recorder-codec
//!
//! Row codecs for Recorder.
//!
//! - **Driver traits**: [`RowCursor`] and [`StatementSink`], the two
//!   collaborators a codec reads from and writes to
//! - **Codecs**: [`Codec`], a per-record converter built once from the
//!   record's table by [`CodecGenerator`]
//! - **Cache**: [`CodecCache`], the shared, generate-on-first-use store of
//!   codecs, and [`CodecView`], a worker's local view of it

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod codec;
pub mod driver;
pub mod generator;

#[cfg(test)]
mod testing;

pub use cache::{CodecCache, CodecView};
pub use codec::{Codec, ColumnCodec};
pub use driver::{bind_value, read_scalar, RowCursor, StatementSink};
pub use generator::CodecGenerator;
