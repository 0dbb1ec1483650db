use std::collections::VecDeque;

use tracing::{debug, trace};

use super::classify::{Row, RowClass, RowClassifier};
use super::decode::Utf8Decoder;
use super::framer::LineFramer;
use crate::error::Result;
use crate::source::{ChunkSource, SourceLease};

/// Pulls classified rows out of a source, one chunk request at a time.
///
/// Blank rows are held back until a data row follows them, so a trailing run of blank lines
/// (including a whitespace-only final line) never reaches the consumer. The source is released
/// as soon as end-of-input is seen, on the first error, or when the reader is dropped.
pub struct RowReader<S: ChunkSource> {
    lease: SourceLease<S>,
    framer: LineFramer,
    classifier: RowClassifier,
    lines: VecDeque<String>,
    ready: VecDeque<Row>,
    held_blanks: usize,
    chunks: u64,
    exhausted: bool,
}

impl<S: ChunkSource> RowReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_decoder(source, Utf8Decoder::new())
    }

    pub fn with_decoder(source: S, decoder: Utf8Decoder) -> Self {
        Self {
            lease: SourceLease::new(source),
            framer: LineFramer::with_decoder(decoder),
            classifier: RowClassifier::new(),
            lines: VecDeque::new(),
            ready: VecDeque::new(),
            held_blanks: 0,
            chunks: 0,
            exhausted: false,
        }
    }

    /// `lossy` selects U+FFFD substitution over failing on malformed UTF-8.
    pub fn with_lossy(source: S, lossy: bool) -> Self {
        let decoder = if lossy {
            Utf8Decoder::lossy()
        } else {
            Utf8Decoder::new()
        };
        Self::with_decoder(source, decoder)
    }

    /// Next row, or `None` once the input is exhausted. After an error the reader is
    /// exhausted as well.
    pub async fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            if let Some(row) = self.ready.pop_front() {
                return Ok(Some(row));
            }
            if let Some(line) = self.lines.pop_front() {
                self.route(&line);
                continue;
            }
            if self.exhausted {
                if self.held_blanks > 0 {
                    debug!(blank_rows = self.held_blanks, "dropping trailing blank rows");
                    self.held_blanks = 0;
                }
                return Ok(None);
            }
            if let Err(err) = self.pull().await {
                self.abort();
                return Err(err);
            }
        }
    }

    pub fn source_released(&self) -> bool {
        self.lease.is_released()
    }

    async fn pull(&mut self) -> Result<()> {
        match self.lease.next_chunk().await? {
            Some(chunk) => {
                self.chunks += 1;
                let lines = self.framer.feed(&chunk)?;
                trace!(bytes = chunk.len(), lines = lines.len(), "chunk framed");
                self.lines.extend(lines);
            }
            None => {
                self.lease.release();
                self.exhausted = true;
                self.lines.extend(self.framer.finish()?);
                debug!(
                    chunks = self.chunks,
                    lines = self.framer.lines(),
                    bytes = self.framer.bytes_decoded(),
                    "end of input"
                );
            }
        }
        Ok(())
    }

    fn route(&mut self, line: &str) {
        let Some(row) = self.classifier.classify(line) else {
            return;
        };
        match row.class {
            RowClass::Blank => self.held_blanks += 1,
            RowClass::Data => {
                self.ready
                    .extend(std::iter::repeat_with(Row::blank).take(self.held_blanks));
                self.held_blanks = 0;
                self.ready.push_back(row);
            }
            RowClass::Header => self.ready.push_back(row),
        }
    }

    fn abort(&mut self) {
        self.lease.release();
        self.exhausted = true;
        self.lines.clear();
        self.ready.clear();
        self.held_blanks = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::MemorySource;

    async fn collect(source: MemorySource) -> Vec<(RowClass, String)> {
        let mut reader = RowReader::new(source);
        let mut rows = Vec::new();
        while let Some(row) = reader.next_row().await.unwrap() {
            rows.push((row.class, row.text));
        }
        assert!(reader.source_released());
        rows
    }

    #[tokio::test]
    async fn interior_blanks_are_kept_trailing_blanks_dropped() {
        let rows = collect(MemorySource::whole("\n\nh\na\n\n \nb\n\n\n  ")).await;
        assert_eq!(
            rows,
            vec![
                (RowClass::Header, "h".into()),
                (RowClass::Data, "a".into()),
                (RowClass::Blank, String::new()),
                (RowClass::Blank, String::new()),
                (RowClass::Data, "b".into()),
            ]
        );
    }

    #[tokio::test]
    async fn same_rows_for_any_fragmentation() {
        let input = "name,age\r\n Alice,30 \r\n\r\nBob,25\nCharlie,35";
        let whole = collect(MemorySource::whole(input)).await;
        for size in [1, 2, 3, 7, 64] {
            let split = collect(MemorySource::chunked(input.as_bytes(), size)).await;
            assert_eq!(split, whole, "chunk size {}", size);
        }
        assert_eq!(whole.len(), 5);
    }

    #[tokio::test]
    async fn decode_error_releases_and_exhausts() {
        let source = MemorySource::new([b"h\na\n".to_vec(), b"\xff\n".to_vec()]);
        let mut reader = RowReader::new(source);
        assert_eq!(reader.next_row().await.unwrap().unwrap().text, "h");
        assert_eq!(reader.next_row().await.unwrap().unwrap().text, "a");

        let err = reader.next_row().await.unwrap_err();
        assert!(matches!(err, Error::Decode { offset: 4 }));
        assert!(reader.source_released());
        assert!(reader.next_row().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lossy_reader_keeps_going() {
        let mut reader = RowReader::with_lossy(MemorySource::whole(&b"h\na\xffb"[..]), true);
        reader.next_row().await.unwrap();
        let row = reader.next_row().await.unwrap().unwrap();
        assert_eq!(row.text, "a\u{FFFD}b");
    }
}
