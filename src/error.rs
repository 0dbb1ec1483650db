use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error produced by an upstream chunk source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read next chunk from source: {0}")]
    SourceRead(#[source] BoxError),
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    Decode { offset: u64 },
    #[error("chunk size must be at least 1, got {0}")]
    InvalidChunkSize(usize),
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write chunk output: {0}")]
    Io(#[from] io::Error),
    #[error("invalid settings: {0}")]
    Config(String),
}

impl Error {
    /// Wrap any upstream failure as a [`Error::SourceRead`].
    pub fn source_read<E: Into<BoxError>>(err: E) -> Self {
        Error::SourceRead(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
