use std::pin::Pin;

use futures::Stream;
use futures_util::StreamExt;

use super::ChunkSource;
use crate::error::{BoxError, Error, Result};

/// Chunk source over a fallible stream of byte buffers (channels, response bodies, ...).
pub struct StreamSource<St> {
    stream: Option<Pin<Box<St>>>,
}

impl<St> StreamSource<St> {
    pub fn new(stream: St) -> Self {
        Self {
            stream: Some(Box::pin(stream)),
        }
    }
}

impl<St, B, E> ChunkSource for StreamSource<St>
where
    St: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<BoxError>,
{
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.next().await {
            Some(Ok(bytes)) => Ok(Some(bytes.as_ref().to_vec())),
            Some(Err(err)) => Err(Error::source_read(err)),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.stream = None;
    }
}
