//! Source trait and the messages a read emits

use crate::error::Result;
use crate::loader::ConfigFieldDefinition;
use crate::state::{State, StreamState};
use crate::stream::HttpStream;
use crate::types::{LogLevel, SyncMode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// Connector Spec
// ============================================================================

/// What a source needs from its user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    pub name: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub config: Vec<ConfigFieldDefinition>,
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub success: bool,

    /// Why the check failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Streams a source offers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogStream>,
}

impl Catalog {
    pub fn stream(&self, name: &str) -> Option<&CatalogStream> {
        self.streams.iter().find(|s| s.name == name)
    }
}

/// One stream in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStream {
    pub name: String,

    /// Always the permissive `{"type": "object"}`
    pub json_schema: Value,

    pub supported_sync_modes: Vec<SyncMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_cursor_field: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_defined_primary_key: Option<Vec<Vec<String>>>,

    /// Stream whose records slice this one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

// ============================================================================
// Messages
// ============================================================================

/// Messages emitted during a read, one JSON line each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    Record {
        stream: String,
        data: Value,
        emitted_at: DateTime<Utc>,
    },

    /// Checkpoint for one stream; every record before it is covered
    State { stream: String, data: Value },

    Log { level: LogLevel, message: String },
}

impl Message {
    pub fn record(stream: impl Into<String>, data: Value) -> Self {
        Self::Record {
            stream: stream.into(),
            data,
            emitted_at: Utc::now(),
        }
    }

    pub fn state(stream: impl Into<String>, state: &StreamState) -> Self {
        Self::State {
            stream: stream.into(),
            data: state.to_value(),
        }
    }

    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }
}

/// Messages of one read, in emission order
pub type MessageStream = BoxStream<'static, Result<Message>>;

// ============================================================================
// Read Settings
// ============================================================================

/// Knobs for one `Source::read`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSettings {
    /// Per-stream record cap
    pub max_records: Option<usize>,
    /// Emit a state message after this many records of a stream
    pub checkpoint_every: usize,
    /// Abort the whole read on the first failed stream
    pub fail_fast: bool,
}

impl Default for ReadSettings {
    fn default() -> Self {
        Self {
            max_records: None,
            checkpoint_every: 1000,
            fail_fast: false,
        }
    }
}

impl ReadSettings {
    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }

    #[must_use]
    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every;
        self
    }

    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }
}

// ============================================================================
// Source Trait
// ============================================================================

/// Entry points a hosting framework drives
#[async_trait]
pub trait Source: Send + Sync {
    fn spec(&self) -> ConnectorSpec;

    /// Streams offered, without contacting the API
    fn discover(&self) -> Catalog;

    /// Verify config and credentials.
    ///
    /// Config and auth problems come back as a failed `CheckResult`, not an
    /// `Err`.
    async fn check_connection(&self, config: &Value) -> CheckResult;

    /// Runtime streams for a config, parents before children
    fn streams(&self, config: &Value) -> Result<Vec<Arc<HttpStream>>>;

    /// Read the selected streams (all when `selection` is `None`)
    async fn read(
        &self,
        config: &Value,
        selection: Option<&[String]>,
        state: Option<&State>,
    ) -> Result<MessageStream>;
}
