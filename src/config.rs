//! Options for the counting and chunking pipelines, plus the settings file the CLI reads.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Default number of bytes requested per read from a reader-backed source.
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

/// Default number of data rows per emitted block.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Row counting rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountOptions {
    /// Include the header row in the total.
    pub count_header_row: bool,
    /// Include blank rows that appear after the header.
    pub count_empty_rows: bool,
    /// Replace malformed UTF-8 with U+FFFD instead of failing.
    pub lossy_utf8: bool,
}

/// Grouping rules for [`crate::chunk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkOptions {
    /// Maximum number of rows (header excluded) per block.
    pub chunk_size: usize,
    /// Keep blank rows after the header as rows of the group.
    pub include_empty_rows: bool,
    /// Replace malformed UTF-8 with U+FFFD instead of failing.
    pub lossy_utf8: bool,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            include_empty_rows: false,
            lossy_utf8: false,
        }
    }
}

impl ChunkOptions {
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidChunkSize(self.chunk_size));
        }
        Ok(())
    }
}

/// Everything the CLI can take from a YAML settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bytes requested per read from files and stdin.
    pub read_size: usize,
    pub count: CountOptions,
    pub chunk: ChunkOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            count: CountOptions::default(),
            chunk: ChunkOptions::default(),
        }
    }
}

impl Settings {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let settings: Settings =
            serde_yaml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.read_size == 0 {
            return Err(Error::Config("read_size must be at least 1".into()));
        }
        self.chunk.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let count = CountOptions::default();
        assert!(!count.count_header_row);
        assert!(!count.count_empty_rows);

        let chunk = ChunkOptions::default();
        assert_eq!(chunk.chunk_size, 100);
        assert!(!chunk.include_empty_rows);
        assert!(chunk.validate().is_ok());
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = ChunkOptions::with_chunk_size(0).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidChunkSize(0)));
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let settings = Settings::from_yaml_str(
            r#"
chunk:
  chunk_size: 25
count:
  count_header_row: true
"#,
        )
        .unwrap();

        assert_eq!(settings.read_size, DEFAULT_READ_SIZE);
        assert_eq!(settings.chunk.chunk_size, 25);
        assert!(!settings.chunk.include_empty_rows);
        assert!(settings.count.count_header_row);
        assert!(!settings.count.count_empty_rows);
    }

    #[test]
    fn yaml_with_zero_chunk_size_fails_validation() {
        let err = Settings::from_yaml_str("chunk:\n  chunk_size: 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidChunkSize(0)));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = Settings::from_yaml_str("read_size: [not, a, number]").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
