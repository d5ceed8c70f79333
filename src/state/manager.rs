//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::reducer::CursorReducer;
use super::types::{State, StreamState};
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file; `None` keeps state in memory only
    path: Option<PathBuf>,
    state: Arc<RwLock<State>>,
    /// Whether to save after every update
    auto_save: bool,
}

impl StateManager {
    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::from_state(State::new())
    }

    /// Wrap an existing state without file persistence
    pub fn from_state(state: State) -> Self {
        Self {
            path: None,
            state: Arc::new(RwLock::new(state)),
            auto_save: false,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self {
            path: Some(path),
            state: Arc::new(RwLock::new(state)),
            auto_save: true,
        })
    }

    /// Create a state manager from inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_state(parse_state(json)?))
    }

    /// Disable saving after every update; call [`save`](Self::save) explicitly
    #[must_use]
    pub fn without_auto_save(mut self) -> Self {
        self.auto_save = false;
        self
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Copy of one stream's checkpoint
    pub async fn stream_state(&self, stream: &str) -> Option<StreamState> {
        self.state.read().await.get_stream(stream).cloned()
    }

    /// Replace one stream's checkpoint
    pub async fn set_stream_state(&self, stream: &str, stream_state: StreamState) -> Result<()> {
        self.state.write().await.set_stream(stream, stream_state);
        self.maybe_save().await
    }

    /// Get a cursor value for a stream
    pub async fn get_cursor(&self, stream: &str, cursor_field: &str) -> Option<Value> {
        self.state
            .read()
            .await
            .get_cursor(stream, cursor_field)
            .cloned()
    }

    /// Fold a record into a stream's checkpoint, never moving it backward.
    ///
    /// Returns true when the checkpoint changed.
    pub async fn advance_cursor(
        &self,
        stream: &str,
        reducer: &CursorReducer,
        record: &Value,
    ) -> Result<bool> {
        let changed = {
            let mut state = self.state.write().await;
            reducer.update(state.get_stream_mut(stream), record)
        };
        if changed {
            self.maybe_save().await?;
        }
        Ok(changed)
    }

    /// Clear state for a specific stream
    pub async fn clear_stream(&self, stream: &str) -> Result<()> {
        self.state.write().await.streams.remove(stream);
        self.maybe_save().await
    }

    async fn maybe_save(&self) -> Result<()> {
        if self.auto_save {
            self.save().await
        } else {
            Ok(())
        }
    }

    /// Save current state to the manager's file, if it has one
    pub async fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to_file(path).await,
            None => Ok(()),
        }
    }

    /// Save state to a specific file path.
    ///
    /// Writes a sibling temp file and renames it over the target so a crash
    /// never leaves a half-written state file.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty().await?;

        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        Ok(())
    }

    /// Export state as JSON string
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as pretty-printed JSON string
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }
}

/// Parse persisted state; an empty document is an empty state
fn parse_state(contents: &str) -> Result<State> {
    if contents.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(contents)
        .map_err(|e| Error::state(format!("Failed to parse state JSON: {e}")))
}
