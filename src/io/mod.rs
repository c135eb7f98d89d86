//! File input and output for the command-line front end.
//!
//! The engine itself works on in-memory bytes. This module turns paths into
//! validated [`DocumentHandle`](crate::document::DocumentHandle)s and
//! [`RasterInput`](crate::engine::RasterInput)s, and writes results back.

pub mod reader;
pub mod writer;

pub use reader::{InputLoader, LoadStatistics, LoadedInput};
pub use writer::{OutputWriter, WriteOptions, WriteStatistics};
