use std::borrow::Cow;

use crate::error::{Error, Result};

const BOM: char = '\u{FEFF}';

/// Streaming UTF-8 decoder.
///
/// Holds the incomplete tail of a code point split across chunks (at most 3 bytes) and
/// completes it with the next chunk. A byte-order mark at the very start of the stream is
/// dropped.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    /// Stream offset of the first byte not yet decoded (the start of `pending`).
    offset: u64,
    started: bool,
    lossy: bool,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace malformed sequences with U+FFFD instead of failing.
    pub fn lossy() -> Self {
        Self {
            lossy: true,
            ..Self::default()
        }
    }

    /// Bytes decoded so far, not counting a pending partial code point.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Decode `chunk` and append the text to `out`.
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) -> Result<()> {
        let start = out.len();
        if self.pending.is_empty() {
            let rest = self.decode_run(chunk, out)?;
            self.pending.extend_from_slice(rest);
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            let rest = self.decode_run(&joined, out)?;
            self.pending = rest.to_vec();
        }
        self.strip_bom(start, out);
        Ok(())
    }

    /// Flush at end-of-input. A code point left incomplete is malformed.
    pub fn finish(&mut self, out: &mut String) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        if !self.lossy {
            return Err(Error::Decode {
                offset: self.offset,
            });
        }
        self.offset += self.pending.len() as u64;
        self.pending.clear();
        out.push(char::REPLACEMENT_CHARACTER);
        Ok(())
    }

    /// Decode as much of `bytes` as possible; returns the incomplete trailing sequence.
    fn decode_run<'a>(&mut self, mut bytes: &'a [u8], out: &mut String) -> Result<&'a [u8]> {
        loop {
            let err = match std::str::from_utf8(bytes) {
                Ok(text) => {
                    out.push_str(text);
                    self.offset += bytes.len() as u64;
                    return Ok(&[]);
                }
                Err(err) => err,
            };

            let valid = err.valid_up_to();
            // borrowed as-is: the prefix is known valid
            if let Cow::Borrowed(text) = String::from_utf8_lossy(&bytes[..valid]) {
                out.push_str(text);
            }
            self.offset += valid as u64;
            bytes = &bytes[valid..];

            match err.error_len() {
                None => return Ok(bytes),
                Some(_) if !self.lossy => {
                    return Err(Error::Decode {
                        offset: self.offset,
                    })
                }
                Some(bad) => {
                    out.push(char::REPLACEMENT_CHARACTER);
                    self.offset += bad as u64;
                    bytes = &bytes[bad..];
                }
            }
        }
    }

    fn strip_bom(&mut self, start: usize, out: &mut String) {
        if self.started || out.len() == start {
            return;
        }
        self.started = true;
        if out[start..].starts_with(BOM) {
            out.replace_range(start..start + BOM.len_utf8(), "");
        }
    }
}
