//! # kapy-io
//!
//! File-based checkpoints between pipeline stages. Gridded series,
//! indicator results, ensemble statistics and areal tables are stored as
//! JSON documents with explicit coordinates and dimension names; missing
//! values are written as `null`.
//!
//! Series go through the [`SeriesLoader`] and [`SeriesWriter`] traits so
//! other formats can be plugged into the command line tool.

mod checkpoint;
mod document;
mod error;

pub use checkpoint::{EncodingHints, JsonCheckpoint, SeriesLoader, SeriesWriter};
pub use error::IoError;
