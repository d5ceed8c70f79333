//! CLI module
//!
//! Command-line interface for running connectors. Messages go to stdout as
//! JSON lines; logs go to stderr.
//!
//! # Commands
//!
//! - `spec` - Show the config a connector needs
//! - `check` - Test connection to the API
//! - `discover` - List available streams
//! - `read` - Extract data from streams
//! - `validate` - Validate a connector definition
//! - `list` - List built-in connectors

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
