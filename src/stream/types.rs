//! Stream types

use crate::error::Error;
use crate::state::CursorReducer;
use crate::types::CursorFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Static description of a stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    /// Absent when the resource has no stable identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub path_template: String,
}

impl StreamDescriptor {
    pub fn new(name: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_template: path_template.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_primary_key(mut self, key: Vec<String>) -> Self {
        self.primary_key = Some(key);
        self
    }

    #[must_use]
    pub fn with_cursor_field(mut self, field: impl Into<String>) -> Self {
        self.cursor_field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Incremental read settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementalConfig {
    /// Record field holding the cursor; also the checkpoint key
    pub cursor_field: String,
    #[serde(default)]
    pub format: CursorFormat,
    /// Pages arrive newest first.
    ///
    /// Each page is reversed so records go out oldest first, and the slice
    /// stops at the first page that reaches back past the checkpoint.
    #[serde(default)]
    pub descending: bool,
}

impl IncrementalConfig {
    pub fn new(cursor_field: impl Into<String>, format: CursorFormat) -> Self {
        Self {
            cursor_field: cursor_field.into(),
            format,
            descending: false,
        }
    }

    #[must_use]
    pub fn descending(mut self) -> Self {
        self.descending = true;
        self
    }

    pub fn reducer(&self) -> CursorReducer {
        CursorReducer::new(self.cursor_field.clone(), self.format)
    }
}

/// HTTP statuses that mean "nothing here" for a slice rather than a failure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorPolicy {
    suppressed: BTreeSet<u16>,
}

impl ErrorPolicy {
    /// Propagate every error
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn suppress(statuses: impl IntoIterator<Item = u16>) -> Self {
        Self {
            suppressed: statuses.into_iter().collect(),
        }
    }

    pub fn is_suppressed(&self, error: &Error) -> bool {
        error.status().is_some_and(|s| self.suppressed.contains(&s))
    }

    pub fn statuses(&self) -> impl Iterator<Item = u16> + '_ {
        self.suppressed.iter().copied()
    }
}

/// Per-read options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Stop after emitting this many records across all slices
    pub max_records: Option<usize>,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_records(mut self, max: usize) -> Self {
        self.max_records = Some(max);
        self
    }
}

/// Counters for one read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadStats {
    pub pages: usize,
    pub records: usize,
    /// Records dropped for not being newer than the checkpoint
    pub skipped: usize,
    pub slices: usize,
    /// Slices that ended in a suppressed HTTP error
    pub suppressed: usize,
}
