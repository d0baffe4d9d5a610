pub mod chunk_key_encoding;
mod error;

pub use zarrs;

pub use chunk_key_encoding::FanoutChunkKeyEncoding;
pub use error::{Error, Result};
