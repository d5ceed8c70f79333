//! Extractor types and traits

use crate::error::Result;
use crate::http::HttpResponse;
use crate::slice::Slice;
use crate::types::CursorFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the records live in a response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseShape {
    /// An array, at the root or under an envelope path
    List {
        #[serde(default)]
        path: Option<String>,
        /// Wrap scalar entries (bare ids) as `{key: value}`
        #[serde(default)]
        scalar_key: Option<String>,
    },
    /// One object per response, at the root or under an envelope path
    Single {
        #[serde(default)]
        path: Option<String>,
    },
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self::List {
            path: None,
            scalar_key: None,
        }
    }
}

impl ResponseShape {
    pub fn list(path: impl Into<String>) -> Self {
        Self::List {
            path: Some(path.into()),
            scalar_key: None,
        }
    }

    pub fn single(path: Option<String>) -> Self {
        Self::Single { path }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Self::List { path, .. } | Self::Single { path } => path.as_deref(),
        }
    }
}

/// Per-record rewrite applied after extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldTransform {
    /// Replace a timestamp field with unix epoch seconds
    EpochSeconds {
        field: String,
        #[serde(default)]
        format: CursorFormat,
    },
    /// Hoist a nested value into a top-level field
    Flatten { field: String, path: String },
    /// Copy a slice value into the record
    StampSlice { slice_key: String, field: String },
    /// Record the URL the page was fetched from
    RequestUrl { field: String },
}

/// Turns one response into the records it carries
pub trait RecordExtractor: Send + Sync + std::fmt::Debug {
    fn extract(&self, response: &HttpResponse, slice: &Slice) -> Result<Vec<Value>>;
}
