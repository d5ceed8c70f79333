//! Slice types and traits

use crate::error::Result;
use crate::state::StreamState;
use crate::template::value_to_string;
use crate::types::JsonObject;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key/value context for one pass of a stream's read loop.
///
/// A slice only lives for the duration of a read and is never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice {
    /// Readable `k=v` label for logs; not unique, see [`Slice::key`]
    pub id: String,
    pub values: JsonObject,
}

impl Slice {
    /// The single empty slice of an unsliced stream
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(values: JsonObject) -> Self {
        let mut pairs: Vec<String> = values
            .iter()
            .map(|(k, v)| format!("{k}={}", value_to_string(v)))
            .collect();
        pairs.sort_unstable();
        let id = pairs.join(",");
        Self { id, values }
    }

    /// Build a slice from key/value pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::new(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Canonical JSON of the values, the identity slices are de-duplicated by.
    ///
    /// Keys serialize sorted, and `1` and `"1"` stay distinct.
    pub fn key(&self) -> String {
        Value::Object(self.values.clone()).to_string()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn is_root(&self) -> bool {
        self.values.is_empty()
    }

    /// The values as a JSON object, for templates
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

impl std::fmt::Display for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            f.write_str("<root>")
        } else {
            f.write_str(&self.id)
        }
    }
}

/// Maps a field of a parent record to a slice key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceProjection {
    /// Dot path into the parent record
    pub field: String,
    /// Key the value is published under in the child's slice
    pub key: String,
}

impl SliceProjection {
    pub fn new(field: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            key: key.into(),
        }
    }
}

/// Drop parent records whose field matches a deny list (case-insensitive)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceExclusion {
    pub field: String,
    pub values: Vec<String>,
}

impl SliceExclusion {
    pub fn excludes(&self, record: &Value) -> bool {
        crate::template::lookup_dotted(record, &self.field)
            .map(value_to_string)
            .is_some_and(|v| self.values.iter().any(|d| d.eq_ignore_ascii_case(&v)))
    }
}

/// Declarative slicing settings, as written in connector definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SliceConfig {
    /// One slice per distinct projection of a parent stream's records
    Parent {
        stream: String,
        fields: Vec<SliceProjection>,
        #[serde(default)]
        exclude: Option<SliceExclusion>,
    },
    /// One slice per listed value
    List { key: String, values: Vec<Value> },
}

/// Produces the slices a stream iterates over
#[async_trait]
pub trait SliceProvider: Send + Sync + std::fmt::Debug {
    /// Enumerate slices from scratch, in first-seen order without duplicates
    async fn slices(&self, state: Option<&StreamState>) -> Result<Vec<Slice>>;
}
