//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs as
//! `{"<stream>": {"<cursor_field>": <value>}}`.

use crate::types::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Complete state for a connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.streams.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.streams.entry(stream.to_string()).or_default()
    }

    /// Replace a stream's state wholesale
    pub fn set_stream(&mut self, stream: &str, state: StreamState) {
        self.streams.insert(stream.to_string(), state);
    }

    /// Get a cursor value for a stream
    pub fn get_cursor(&self, stream: &str, cursor_field: &str) -> Option<&Value> {
        self.streams.get(stream)?.get(cursor_field)
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Checkpoint of a single stream: cursor field to scalar value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamState {
    pub values: JsonObject,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state holding one cursor value
    pub fn with_cursor(cursor_field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = JsonObject::new();
        values.insert(cursor_field.into(), value.into());
        Self { values }
    }

    /// Cursor value, ignoring explicit nulls
    pub fn get(&self, cursor_field: &str) -> Option<&Value> {
        self.values.get(cursor_field).filter(|v| !v.is_null())
    }

    pub fn set(&mut self, cursor_field: impl Into<String>, value: Value) {
        self.values.insert(cursor_field.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The state as a JSON object, for templates and messages
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
