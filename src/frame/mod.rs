//! Incremental line framing shared by the counting and chunking pipelines.
//!
//! Raw chunks are decoded as UTF-8 (a code point may be split across chunks), split on LF into
//! lines, and each line is classified as header, data or blank by its trimmed form.

pub mod classify;
pub mod decode;
pub mod framer;
pub mod rows;

pub use classify::{Row, RowClass, RowClassifier};
pub use decode::Utf8Decoder;
pub use framer::LineFramer;
pub use rows::RowReader;
