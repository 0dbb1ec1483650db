pub mod chunk;
pub mod count;
pub mod write;

pub use chunk::{chunk, Grouper};
pub use count::count_rows;
pub use write::{write_chunks, RowsAndBytes, WrittenChunks};
