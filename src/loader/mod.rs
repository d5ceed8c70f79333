//! YAML Loader module
//!
//! Parse connector definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `ConnectorDefinition` - Declarative connector specification
//! - `StreamDefinition` - Stream configuration
//! - YAML parsing with validation
//! - `build_client` / `build_streams` - runtime construction for a user config

mod builder;
mod parser;
mod types;

pub use builder::{build_client, build_streams};
pub use parser::{load_connector, load_connector_from_str, validate_connector};
pub use types::{
    AuthDefinition, CheckDefinition, ConfigFieldDefinition, ConnectorDefinition, HttpDefinition,
    OtpDefinition, RequestDefinition, StreamDefinition,
};

#[cfg(test)]
mod tests;
