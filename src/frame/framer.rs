use memchr::memchr_iter;

use super::decode::Utf8Decoder;
use crate::error::Result;

/// Splits a chunked byte stream into LF-delimited lines.
///
/// Decoded text accumulates in a line buffer; every complete line is handed out as soon as its
/// newline arrives and the buffer keeps only the unterminated remainder. Lines are returned
/// untrimmed.
#[derive(Debug, Default)]
pub struct LineFramer {
    decoder: Utf8Decoder,
    buffer: String,
    lines: u64,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decoder(decoder: Utf8Decoder) -> Self {
        Self {
            decoder,
            ..Self::default()
        }
    }

    /// Decode `chunk` and return every line it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        // the buffer never holds a newline between calls
        let scan_from = self.buffer.len();
        self.decoder.decode(chunk, &mut self.buffer)?;
        Ok(self.take_complete_lines(scan_from))
    }

    /// End-of-input: the unterminated remainder becomes the final line when non-empty.
    /// Whitespace-only remainders still count as non-empty here.
    pub fn finish(&mut self) -> Result<Option<String>> {
        self.decoder.finish(&mut self.buffer)?;
        if self.buffer.is_empty() {
            return Ok(None);
        }
        self.lines += 1;
        Ok(Some(std::mem::take(&mut self.buffer)))
    }

    /// Lines produced so far, including a final unterminated one.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Bytes of input decoded so far.
    pub fn bytes_decoded(&self) -> u64 {
        self.decoder.offset()
    }

    /// Length of the unterminated remainder currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn take_complete_lines(&mut self, scan_from: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut start = 0;
        // LF never occurs inside a multi-byte sequence, so every hit is a char boundary
        for pos in memchr_iter(b'\n', &self.buffer.as_bytes()[scan_from..]) {
            let end = scan_from + pos;
            lines.push(self.buffer[start..end].to_string());
            start = end + 1;
        }
        if start > 0 {
            self.buffer.drain(..start);
        }
        self.lines += lines.len() as u64;
        lines
    }
}
