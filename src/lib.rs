//! Incremental row counting and header-preserving chunking of line-delimited CSV streams.
//!
//! Input arrives as a sequence of byte chunks pulled from a [`ChunkSource`]. A row is one
//! LF-delimited line, trimmed; the first non-blank row is the header. No field-level CSV
//! parsing is done.

pub mod config;
pub mod error;
pub mod frame;
pub mod process;
pub mod source;

pub use config::{ChunkOptions, CountOptions, Settings};
pub use error::{Error, Result};
pub use process::{chunk, count_rows, write_chunks, Grouper, RowsAndBytes, WrittenChunks};
pub use source::{
    ChunkSource, HttpSource, MemorySource, ReaderSource, SourceLease, StreamSource,
};
