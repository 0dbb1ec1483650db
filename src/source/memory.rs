use std::collections::VecDeque;

use super::ChunkSource;
use crate::error::Result;

/// In-memory chunk source; the chunk boundaries are exactly the ones given.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    chunks: VecDeque<Vec<u8>>,
}

impl MemorySource {
    pub fn new<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    /// The whole buffer as a single chunk.
    pub fn whole(data: impl Into<Vec<u8>>) -> Self {
        Self::new([data.into()])
    }

    /// Split `data` into chunks of `size` bytes (the last may be shorter).
    pub fn chunked(data: &[u8], size: usize) -> Self {
        Self::new(data.chunks(size.max(1)).map(<[u8]>::to_vec))
    }

    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl ChunkSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }

    fn release(&mut self) {
        self.chunks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunked_splits_on_byte_boundaries() {
        let mut source = MemorySource::chunked("héllo".as_bytes(), 2);
        assert_eq!(source.remaining(), 3);

        let mut out = Vec::new();
        while let Some(chunk) = source.next_chunk().await.unwrap() {
            out.push(chunk);
        }
        assert_eq!(out, vec![b"h\xc3".to_vec(), b"\xa9l".to_vec(), b"lo".to_vec()]);
    }

    #[tokio::test]
    async fn empty_input_has_no_chunks() {
        let mut source = MemorySource::chunked(b"", 4);
        assert_eq!(source.next_chunk().await.unwrap(), None);
    }
}
