use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, Stdin};
use tracing::debug;

use super::ChunkSource;
use crate::config::DEFAULT_READ_SIZE;
use crate::error::{Error, Result};

/// Chunk source over any async reader; each read becomes one chunk.
pub struct ReaderSource<R> {
    reader: Option<R>,
    read_size: usize,
    bytes_read: u64,
}

impl<R: AsyncRead + Unpin> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_read_size(reader, DEFAULT_READ_SIZE)
    }

    pub fn with_read_size(reader: R, read_size: usize) -> Self {
        Self {
            reader: Some(reader),
            read_size: read_size.max(1),
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl ReaderSource<File> {
    /// Open `path` for reading.
    pub async fn open_file<P: AsRef<Path>>(path: P, read_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await.map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), read_size, "opened file source");
        Ok(Self::with_read_size(file, read_size))
    }
}

impl ReaderSource<Stdin> {
    pub fn stdin(read_size: usize) -> Self {
        Self::with_read_size(tokio::io::stdin(), read_size)
    }
}

impl<R: AsyncRead + Unpin> ChunkSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; self.read_size];
        let n = reader.read(&mut buf).await.map_err(Error::source_read)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.bytes_read += n as u64;
        Ok(Some(buf))
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            debug!(bytes_read = self.bytes_read, "closed reader source");
        }
    }
}
