//! Pull-based byte sources.
//!
//! A pipeline asks its source for one chunk at a time and suspends only while waiting for it.
//! Sources are held through a [`SourceLease`], which releases the underlying resource exactly
//! once: as soon as end-of-input is seen, or when the lease is dropped on any other exit path
//! (consumer stopped early, read or decode error, panic).

pub mod http;
pub mod memory;
pub mod reader;
pub mod stream;

pub use http::HttpSource;
pub use memory::MemorySource;
pub use reader::ReaderSource;
pub use stream::StreamSource;

use tracing::trace;

use crate::error::Result;

/// A sequence of raw byte chunks delivered in arrival order.
#[allow(async_fn_in_trait)]
pub trait ChunkSource {
    /// Next chunk, or `None` at end-of-input. Empty chunks are allowed.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Give back the underlying resource. Called at most once, through [`SourceLease`].
    fn release(&mut self) {}
}

/// Exclusive hold on a source for the lifetime of one pipeline invocation.
pub struct SourceLease<S: ChunkSource> {
    source: S,
    released: bool,
}

impl<S: ChunkSource> SourceLease<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            released: false,
        }
    }

    /// Pull the next chunk. A released lease always reports end-of-input.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.released {
            return Ok(None);
        }
        self.source.next_chunk().await
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.source.release();
            trace!("source released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<S: ChunkSource> Drop for SourceLease<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counted {
        chunks: Vec<Vec<u8>>,
        releases: Arc<AtomicUsize>,
    }

    impl ChunkSource for Counted {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            Ok(if self.chunks.is_empty() {
                None
            } else {
                Some(self.chunks.remove(0))
            })
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn lease_releases_once_even_when_dropped_after_explicit_release() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut lease = SourceLease::new(Counted {
            chunks: vec![b"a".to_vec()],
            releases: releases.clone(),
        });

        assert_eq!(lease.next_chunk().await.unwrap(), Some(b"a".to_vec()));
        lease.release();
        assert!(lease.is_released());
        assert_eq!(lease.next_chunk().await.unwrap(), None);
        drop(lease);

        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropping_an_unfinished_lease_releases_the_source() {
        let releases = Arc::new(AtomicUsize::new(0));
        let lease = SourceLease::new(Counted {
            chunks: vec![b"a".to_vec(), b"b".to_vec()],
            releases: releases.clone(),
        });
        drop(lease);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
