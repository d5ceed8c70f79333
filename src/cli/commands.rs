//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tributary connector CLI
#[derive(Parser, Debug)]
#[command(name = "tributary")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Built-in connector name or connector definition file (YAML)
    #[arg(short, long, global = true)]
    pub connector: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON); updated as checkpoints arrive
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show connector specification
    Spec,

    /// Test connection to the API
    Check {
        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,
    },

    /// Discover available streams
    Discover,

    /// Read data from streams
    Read {
        /// Streams to read (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,

        /// Inline config JSON
        #[arg(long)]
        config_json: Option<String>,

        /// Maximum records per stream
        #[arg(long)]
        max_records: Option<usize>,

        /// Emit state after this many records of a stream
        #[arg(long, default_value = "1000")]
        checkpoint_every: usize,

        /// Stop at the first failed stream
        #[arg(long)]
        fail_fast: bool,

        /// Write the final state here
        #[arg(long)]
        state_out: Option<PathBuf>,
    },

    /// Validate connector definition
    Validate,

    /// List built-in connectors
    List,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
