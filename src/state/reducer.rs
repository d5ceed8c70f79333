//! Incremental state reducer
//!
//! Folds emitted records into a stream checkpoint. The checkpoint only ever
//! moves forward: a record older than the current value leaves it alone.

use super::types::StreamState;
use crate::template::lookup_dotted;
use crate::types::CursorFormat;
use serde_json::Value;

/// Computes the next checkpoint from the current one and a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorReducer {
    /// Record field holding the cursor (dot path allowed); also the state key
    pub cursor_field: String,
    pub format: CursorFormat,
}

impl CursorReducer {
    pub fn new(cursor_field: impl Into<String>, format: CursorFormat) -> Self {
        Self {
            cursor_field: cursor_field.into(),
            format,
        }
    }

    /// Cursor value carried by a record, if any
    pub fn record_cursor<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        lookup_dotted(record, &self.cursor_field).filter(|v| !v.is_null())
    }

    /// The later of the current checkpoint and the record's cursor.
    ///
    /// With no checkpoint the record's value is adopted as-is. A record whose
    /// cursor is missing or unparseable leaves the checkpoint unchanged.
    pub fn advance(&self, current: Option<&Value>, latest_record: &Value) -> Option<Value> {
        let candidate = self.record_cursor(latest_record);
        match (current, candidate) {
            (None, Some(candidate)) => Some(candidate.clone()),
            (Some(current), None) => Some(current.clone()),
            (None, None) => None,
            (Some(current), Some(candidate)) => {
                match (self.format.parse(current), self.format.parse(candidate)) {
                    (Some(a), Some(b)) if b > a => Some(candidate.clone()),
                    // An unreadable checkpoint is replaced by any readable value
                    (None, Some(_)) => Some(candidate.clone()),
                    _ => Some(current.clone()),
                }
            }
        }
    }

    /// Whether a record is strictly newer than the checkpoint.
    ///
    /// Everything is newer than an absent checkpoint. Records without a
    /// readable cursor are kept rather than silently dropped.
    pub fn is_newer(&self, checkpoint: Option<&Value>, record: &Value) -> bool {
        let Some(checkpoint) = checkpoint.and_then(|c| self.format.parse(c)) else {
            return true;
        };
        match self.record_cursor(record).and_then(|v| self.format.parse(v)) {
            Some(value) => value > checkpoint,
            None => true,
        }
    }

    /// Apply [`advance`](Self::advance) to a stream state in place.
    ///
    /// Returns true when the checkpoint changed.
    pub fn update(&self, state: &mut StreamState, latest_record: &Value) -> bool {
        let current = state.get(&self.cursor_field);
        match self.advance(current, latest_record) {
            Some(next) if Some(&next) != current => {
                state.set(self.cursor_field.clone(), next);
                true
            }
            _ => false,
        }
    }
}
