use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csvchunk::{
    chunk, count_rows, write_chunks, ChunkSource, HttpSource, ReaderSource, Settings,
};
use futures::{pin_mut, StreamExt};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::{fs::File, io::Stdin, time::Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

#[derive(Parser)]
#[command(name = "csvchunk", version)]
#[command(about = "Count or regroup the rows of a line-delimited CSV stream")]
struct Args {
    /// YAML settings file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bytes requested per read from files and stdin
    #[arg(long, global = true)]
    read_size: Option<usize>,

    /// Replace malformed UTF-8 with U+FFFD instead of failing
    #[arg(long, global = true)]
    lossy: bool,

    /// Print a JSON summary instead of plain output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Count rows
    Count {
        /// File path, `-` for stdin, or an http(s) URL
        input: String,

        #[arg(long)]
        count_header_row: bool,

        #[arg(long)]
        count_empty_rows: bool,
    },
    /// Split rows into header-prefixed blocks
    Chunk {
        /// File path, `-` for stdin, or an http(s) URL
        input: String,

        /// Rows per block, header excluded
        #[arg(short = 'n', long)]
        chunk_size: Option<usize>,

        #[arg(long)]
        include_empty_rows: bool,

        /// Write `<stem>-chunk-<i>.csv` files here instead of printing blocks
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

/// The inputs the CLI knows how to open.
enum Input {
    Stdin(ReaderSource<Stdin>),
    File(ReaderSource<File>),
    Http(HttpSource),
}

impl ChunkSource for Input {
    async fn next_chunk(&mut self) -> csvchunk::Result<Option<Vec<u8>>> {
        match self {
            Input::Stdin(s) => s.next_chunk().await,
            Input::File(s) => s.next_chunk().await,
            Input::Http(s) => s.next_chunk().await,
        }
    }

    fn release(&mut self) {
        match self {
            Input::Stdin(s) => s.release(),
            Input::File(s) => s.release(),
            Input::Http(s) => s.release(),
        }
    }
}

async fn open_input(input: &str, read_size: usize) -> Result<Input> {
    if input == "-" {
        return Ok(Input::Stdin(ReaderSource::stdin(read_size)));
    }
    if let Ok(url) = Url::parse(input) {
        if matches!(url.scheme(), "http" | "https") {
            let source = HttpSource::open(&Client::new(), url.as_str())
                .await
                .with_context(|| format!("fetching {}", input))?;
            return Ok(Input::Http(source));
        }
    }
    let source = ReaderSource::open_file(input, read_size).await?;
    Ok(Input::File(source))
}

/// Name used for chunk files: the file stem, or the last URL path segment.
fn input_stem(input: &str) -> String {
    if input == "-" {
        return "stdin".to_string();
    }
    let name = match Url::parse(input) {
        Ok(url) if url.has_host() => url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .map(str::to_string),
        _ => None,
    }
    .unwrap_or_else(|| input.to_string());

    Path::new(&name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "input".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // logs go to stderr; stdout carries results only
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(read_size) = args.read_size {
        settings.read_size = read_size;
    }
    settings.validate()?;

    let start = Instant::now();
    match args.command {
        Command::Count {
            input,
            count_header_row,
            count_empty_rows,
        } => {
            let mut options = settings.count;
            options.count_header_row |= count_header_row;
            options.count_empty_rows |= count_empty_rows;
            options.lossy_utf8 |= args.lossy;

            let source = open_input(&input, settings.read_size).await?;
            let total = count_rows(source, options)
                .await
                .with_context(|| format!("counting rows of {}", input))?;
            info!(input = %input, total, elapsed = ?start.elapsed(), "counted");

            if args.json {
                println!("{}", serde_json::json!({ "input": input, "rows": total }));
            } else {
                println!("{}", total);
            }
        }

        Command::Chunk {
            input,
            chunk_size,
            include_empty_rows,
            out_dir,
        } => {
            let mut options = settings.chunk;
            if let Some(chunk_size) = chunk_size {
                options.chunk_size = chunk_size;
            }
            options.include_empty_rows |= include_empty_rows;
            options.lossy_utf8 |= args.lossy;
            options.validate()?;

            let source = open_input(&input, settings.read_size).await?;
            let blocks = chunk(source, options)?;

            match out_dir {
                Some(dir) => {
                    let written = write_chunks(blocks, &dir, &input_stem(&input))
                        .await
                        .with_context(|| format!("chunking {} into {}", input, dir.display()))?;
                    info!(
                        input = %input,
                        chunks = written.paths.len(),
                        rows = written.totals.rows,
                        elapsed = ?start.elapsed(),
                        "chunked"
                    );
                    if args.json {
                        let paths: Vec<String> = written
                            .paths
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect();
                        println!(
                            "{}",
                            serde_json::json!({
                                "input": input,
                                "chunks": paths,
                                "rows": written.totals.rows,
                                "bytes": written.totals.bytes,
                            })
                        );
                    }
                }
                None => {
                    pin_mut!(blocks);
                    let mut count = 0usize;
                    while let Some(block) = blocks.next().await {
                        let block = block.with_context(|| format!("chunking {}", input))?;
                        if args.json {
                            println!("{}", serde_json::json!({ "index": count, "block": block }));
                        } else {
                            if count > 0 {
                                println!();
                            }
                            println!("{}", block);
                        }
                        count += 1;
                    }
                    info!(input = %input, chunks = count, elapsed = ?start.elapsed(), "chunked");
                }
            }
        }
    }

    Ok(())
}
