use futures::stream::{self, Stream};
use tracing::{debug, instrument};

use crate::config::ChunkOptions;
use crate::error::{Error, Result};
use crate::frame::{Row, RowClass, RowReader};
use crate::source::ChunkSource;

#[derive(Debug)]
enum GroupState {
    AwaitingHeader,
    Accumulating { header: String, rows: Vec<String> },
    Done,
}

/// Regroups classified rows into header-prefixed blocks of at most `chunk_size` rows.
#[derive(Debug)]
pub struct Grouper {
    state: GroupState,
    chunk_size: usize,
    include_empty_rows: bool,
    blocks: usize,
}

impl Grouper {
    pub fn new(options: &ChunkOptions) -> Self {
        Self {
            state: GroupState::AwaitingHeader,
            chunk_size: options.chunk_size.max(1),
            include_empty_rows: options.include_empty_rows,
            blocks: 0,
        }
    }

    /// Blocks emitted so far.
    pub fn blocks(&self) -> usize {
        self.blocks
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, GroupState::Done)
    }

    /// Add a row; returns a block when the group just reached `chunk_size`.
    pub fn push(&mut self, row: Row) -> Option<String> {
        match &mut self.state {
            GroupState::AwaitingHeader => {
                if row.class == RowClass::Header {
                    self.state = GroupState::Accumulating {
                        header: row.text,
                        rows: Vec::with_capacity(self.chunk_size.min(1024)),
                    };
                }
                None
            }
            GroupState::Accumulating { header, rows } => {
                match row.class {
                    RowClass::Header => return None,
                    RowClass::Blank if !self.include_empty_rows => return None,
                    RowClass::Blank | RowClass::Data => rows.push(row.text),
                }
                if rows.len() < self.chunk_size {
                    return None;
                }
                let block = render_block(header, rows);
                rows.clear();
                self.blocks += 1;
                Some(block)
            }
            GroupState::Done => None,
        }
    }

    /// End-of-input: emit the partially filled group, if any. Later calls return `None`.
    pub fn finish(&mut self) -> Option<String> {
        match std::mem::replace(&mut self.state, GroupState::Done) {
            GroupState::Accumulating { header, rows } if !rows.is_empty() => {
                self.blocks += 1;
                Some(render_block(&header, &rows))
            }
            _ => None,
        }
    }
}

/// `header\nrow\nrow...` with no trailing newline.
fn render_block(header: &str, rows: &[String]) -> String {
    let size = header.len() + rows.iter().map(|r| r.len() + 1).sum::<usize>();
    let mut block = String::with_capacity(size);
    block.push_str(header);
    for row in rows {
        block.push('\n');
        block.push_str(row);
    }
    block
}

struct ChunkState<S: ChunkSource> {
    rows: RowReader<S>,
    grouper: Grouper,
}

impl<S: ChunkSource> ChunkState<S> {
    async fn next_block(&mut self) -> Result<Option<String>> {
        while let Some(row) = self.rows.next_row().await? {
            if let Some(block) = self.grouper.push(row) {
                debug!(block = self.grouper.blocks(), "block ready");
                return Ok(Some(block));
            }
        }
        let last = self.grouper.finish();
        if last.is_some() {
            debug!(block = self.grouper.blocks(), "final block ready");
        }
        Ok(last)
    }
}

/// Lazily regroup the rows of `source` into header-prefixed blocks.
///
/// Options are validated before anything is read. The returned stream pulls from the source
/// only when polled; dropping it early releases the source. An error is yielded once and ends
/// the stream.
#[instrument(level = "debug", skip(source))]
pub fn chunk<S: ChunkSource>(
    source: S,
    options: ChunkOptions,
) -> Result<impl Stream<Item = Result<String>>> {
    let rows = RowReader::with_lossy(source, options.lossy_utf8);
    options.validate()?;

    let state = ChunkState {
        rows,
        grouper: Grouper::new(&options),
    };
    Ok(stream::try_unfold(state, |mut state| async move {
        let block = state.next_block().await?;
        Ok::<_, Error>(block.map(|block| (block, state)))
    }))
}
