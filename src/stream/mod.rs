//! Stream driver module
//!
//! # Overview
//!
//! - `HttpStream` - one generic stream composed from a request builder, a
//!   record extractor, a page strategy and an optional slice provider
//! - `ReadLoop` - the lazy, sequential record sequence of one read
//! - `ErrorPolicy` - HTTP statuses that skip a slice instead of failing

mod http_stream;
mod read_loop;
mod types;

pub use http_stream::{HttpStream, Page};
pub use read_loop::ReadLoop;
pub use types::{ErrorPolicy, IncrementalConfig, ReadOptions, ReadStats, StreamDescriptor};
