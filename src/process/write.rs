use futures::{pin_mut, Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;

/// A simple accumulator for rows and bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowsAndBytes {
    pub rows: u64,
    pub bytes: u64,
}

impl RowsAndBytes {
    pub const ZERO: Self = RowsAndBytes { rows: 0, bytes: 0 };

    /// Add another RowsAndBytes into `self`, saturating on overflow.
    pub fn add(&mut self, other: RowsAndBytes) {
        self.rows = self.rows.saturating_add(other.rows);
        self.bytes = self.bytes.saturating_add(other.bytes);
    }
}

/// Files produced by [`write_chunks`], in block order.
#[derive(Debug, Clone, Default)]
pub struct WrittenChunks {
    pub paths: Vec<PathBuf>,
    /// Data rows (headers excluded) and bytes across all files.
    pub totals: RowsAndBytes,
}

/// Write every block of `blocks` to `<out_dir>/<stem>-chunk-<index>.csv`.
///
/// Each file is written under a `.tmp` name and renamed once complete, so a reader of
/// `out_dir` never sees a partial block. Stops at the first error; files already renamed
/// stay in place.
#[instrument(level = "info", skip(blocks, out_dir), fields(out_dir = %out_dir.as_ref().display()))]
pub async fn write_chunks<St, P>(blocks: St, out_dir: P, stem: &str) -> Result<WrittenChunks>
where
    St: Stream<Item = Result<String>>,
    P: AsRef<Path>,
{
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).await?;

    pin_mut!(blocks);
    let mut written = WrittenChunks::default();

    while let Some(block) = blocks.next().await {
        let block = block?;
        let index = written.paths.len();
        let final_path = out_dir.join(format!("{}-chunk-{}.csv", stem, index));
        let tmp_path = out_dir.join(format!("{}-chunk-{}.csv.tmp", stem, index));

        if let Err(err) = fs::write(&tmp_path, block.as_bytes()).await {
            if fs::remove_file(&tmp_path).await.is_err() {
                warn!(path = %tmp_path.display(), "could not remove partial chunk file");
            }
            return Err(err.into());
        }
        fs::rename(&tmp_path, &final_path).await?;

        // one newline per data row after the header
        let counts = RowsAndBytes {
            rows: block.matches('\n').count() as u64,
            bytes: block.len() as u64,
        };
        written.totals.add(counts);
        debug!(
            path = %final_path.display(),
            rows = counts.rows,
            bytes = counts.bytes,
            "chunk written"
        );
        written.paths.push(final_path);
    }

    info!(
        chunks = written.paths.len(),
        rows = written.totals.rows,
        bytes = written.totals.bytes,
        "all chunks written"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkOptions;
    use crate::error::Error;
    use crate::process::chunk;
    use crate::source::MemorySource;
    use tempfile::tempdir;
    use tracing_subscriber::{fmt, EnvFilter};

    fn init_logging() {
        let _ = fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .with_target(false)
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn rows_and_bytes_saturate() {
        let mut totals = RowsAndBytes {
            rows: u64::MAX - 1,
            bytes: 10,
        };
        totals.add(RowsAndBytes { rows: 5, bytes: 5 });
        assert_eq!(totals, RowsAndBytes { rows: u64::MAX, bytes: 15 });
    }

    #[tokio::test]
    async fn writes_one_file_per_block() -> anyhow::Result<()> {
        init_logging();
        let dir = tempdir()?;
        let input = "name,age\nAlice,30\nBob,25\nCharlie,35";
        let blocks = chunk(MemorySource::whole(input), ChunkOptions::with_chunk_size(2))?;

        let written = write_chunks(blocks, dir.path().join("out"), "people").await?;

        assert_eq!(written.paths.len(), 2);
        assert_eq!(written.totals.rows, 3);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/people-chunk-0.csv"))?,
            "name,age\nAlice,30\nBob,25"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out/people-chunk-1.csv"))?,
            "name,age\nCharlie,35"
        );
        let leftovers = std::fs::read_dir(dir.path().join("out"))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[tokio::test]
    async fn stops_at_the_first_failed_block() -> anyhow::Result<()> {
        init_logging();
        let dir = tempdir()?;
        let source = MemorySource::new([b"h\na\nb\n".to_vec(), b"c\xff".to_vec()]);
        let blocks = chunk(source, ChunkOptions::with_chunk_size(1))?;

        let err = write_chunks(blocks, dir.path(), "bad").await.unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert!(dir.path().join("bad-chunk-0.csv").exists());
        assert!(dir.path().join("bad-chunk-1.csv").exists());
        assert!(!dir.path().join("bad-chunk-2.csv").exists());
        Ok(())
    }
}
