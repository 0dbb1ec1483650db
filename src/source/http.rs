use reqwest::{Client, Response};
use tracing::{debug, info};
use url::Url;

use super::ChunkSource;
use crate::error::{Error, Result};

/// Chunk source over an HTTP response body, pulled one network chunk at a time.
pub struct HttpSource {
    url: Url,
    response: Option<Response>,
    bytes_read: u64,
}

impl HttpSource {
    /// Send a GET for `url` and hold the response body as the source.
    /// Non-success statuses are reported as source read errors.
    pub async fn open(client: &Client, url: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(Error::source_read)?;
        let response = client
            .get(url.as_str())
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(Error::source_read)?;

        info!(url = %url, status = %response.status(), "opened http source");
        Ok(Self {
            url,
            response: Some(response),
            bytes_read: 0,
        })
    }
}

impl ChunkSource for HttpSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(response) = self.response.as_mut() else {
            return Ok(None);
        };
        match response.chunk().await.map_err(Error::source_read)? {
            Some(bytes) => {
                self.bytes_read += bytes.len() as u64;
                Ok(Some(bytes.to_vec()))
            }
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        if self.response.take().is_some() {
            debug!(url = %self.url, bytes_read = self.bytes_read, "closed http source");
        }
    }
}
