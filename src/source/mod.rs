//! Source module
//!
//! # Overview
//!
//! - `Source` - the entry points a host drives: spec, discover, check, read
//! - `DeclarativeSource` - a `Source` built from a `ConnectorDefinition`
//! - `Message` - records, per-stream state checkpoints and logs, in the
//!   order a read emits them

mod declarative;
mod types;

pub use declarative::DeclarativeSource;
pub use types::{
    Catalog, CatalogStream, CheckResult, ConnectorSpec, Message, MessageStream, ReadSettings,
    Source,
};

#[cfg(test)]
mod tests;
