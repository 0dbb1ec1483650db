use tracing::{debug, instrument};

use crate::config::CountOptions;
use crate::error::Result;
use crate::frame::{RowClass, RowReader};
use crate::source::ChunkSource;

/// Count the rows of `source` under `options`.
///
/// Data rows always count; the header and post-header blank rows count only when enabled.
/// Runs until end-of-input; any read or decode error aborts with no partial total.
#[instrument(level = "debug", skip(source))]
pub async fn count_rows<S: ChunkSource>(source: S, options: CountOptions) -> Result<u64> {
    let mut rows = RowReader::with_lossy(source, options.lossy_utf8);
    let mut total = 0u64;

    while let Some(row) = rows.next_row().await? {
        let counted = match row.class {
            RowClass::Header => options.count_header_row,
            RowClass::Data => true,
            RowClass::Blank => options.count_empty_rows,
        };
        if counted {
            total += 1;
        }
    }

    debug!(total, "row count complete");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::source::MemorySource;

    async fn count(input: &str, options: CountOptions) -> u64 {
        count_rows(MemorySource::whole(input), options).await.unwrap()
    }

    fn with_header() -> CountOptions {
        CountOptions {
            count_header_row: true,
            ..CountOptions::default()
        }
    }

    fn with_empty() -> CountOptions {
        CountOptions {
            count_empty_rows: true,
            ..CountOptions::default()
        }
    }

    #[tokio::test]
    async fn counts_data_rows_by_default() {
        let input = "name,age\nAlice,30\nBob,25\nCharlie,35";
        assert_eq!(count(input, CountOptions::default()).await, 3);
        assert_eq!(count(input, with_header()).await, 4);
    }

    #[tokio::test]
    async fn header_only_and_empty_inputs() {
        assert_eq!(count("name,age", CountOptions::default()).await, 0);
        assert_eq!(count("name,age", with_header()).await, 1);
        assert_eq!(count("", CountOptions::default()).await, 0);
        assert_eq!(count("", with_header()).await, 0);
        assert_eq!(count("\n \n\t\n", with_header()).await, 0);
    }

    #[tokio::test]
    async fn blank_rows_between_data_rows() {
        let input = "h\na\n\n   \nb\n";
        assert_eq!(count(input, CountOptions::default()).await, 2);
        assert_eq!(count(input, with_empty()).await, 4);
    }

    #[tokio::test]
    async fn leading_and_trailing_blanks_never_count() {
        let input = "\n\nh\na\nb\n\n\n";
        assert_eq!(count(input, CountOptions::default()).await, 2);
        assert_eq!(count(input, with_empty()).await, 2);
        let all = CountOptions {
            count_header_row: true,
            count_empty_rows: true,
            lossy_utf8: false,
        };
        assert_eq!(count(input, all).await, 3);
    }

    #[tokio::test]
    async fn decode_error_aborts_the_count() {
        let source = MemorySource::new([b"h\na\n".to_vec(), b"b\xc3(\n".to_vec()]);
        let err = count_rows(source, CountOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { offset: 5 }));
    }
}
