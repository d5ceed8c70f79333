//! Slice provider implementations

use super::types::{Slice, SliceExclusion, SliceProjection, SliceProvider};
use crate::error::Result;
use crate::state::StreamState;
use crate::stream::{HttpStream, ReadOptions};
use crate::template::lookup_dotted;
use crate::types::JsonObject;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// Parent Slices
// ============================================================================

/// One slice per distinct projection of a parent stream's records.
///
/// The parent is read from scratch to completion on every call, ignoring
/// any checkpoint it might have. Chaining works by making the parent itself
/// a child: its records carry the grandparent's value (see
/// [`FieldTransform::StampSlice`](crate::extract::FieldTransform::StampSlice))
/// and the projection picks up both.
#[derive(Debug, Clone)]
pub struct ParentSlices {
    parent: Arc<HttpStream>,
    projections: Vec<SliceProjection>,
    exclude: Option<SliceExclusion>,
}

impl ParentSlices {
    pub fn new(parent: Arc<HttpStream>, projections: Vec<SliceProjection>) -> Self {
        Self {
            parent,
            projections,
            exclude: None,
        }
    }

    /// Slice on a single parent field
    pub fn on_field(
        parent: Arc<HttpStream>,
        field: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self::new(parent, vec![SliceProjection::new(field, key)])
    }

    #[must_use]
    pub fn with_exclusion(mut self, exclude: SliceExclusion) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn parent(&self) -> &Arc<HttpStream> {
        &self.parent
    }

    /// Project one parent record, or `None` if any projected field is missing
    fn project(&self, record: &Value) -> Option<Slice> {
        let mut values = JsonObject::new();
        for projection in &self.projections {
            let value = lookup_dotted(record, &projection.field).filter(|v| !v.is_null())?;
            values.insert(projection.key.clone(), value.clone());
        }
        Some(Slice::new(values))
    }
}

#[async_trait]
impl SliceProvider for ParentSlices {
    async fn slices(&self, _state: Option<&StreamState>) -> Result<Vec<Slice>> {
        let mut read = self.parent.read(None, ReadOptions::default());

        let mut seen = HashSet::new();
        let mut slices = Vec::new();
        let mut skipped = 0usize;

        while let Some(record) = read.next_record().await? {
            if self.exclude.as_ref().is_some_and(|e| e.excludes(&record)) {
                skipped += 1;
                continue;
            }
            match self.project(&record) {
                Some(slice) => {
                    if seen.insert(slice.key()) {
                        slices.push(slice);
                    }
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(parent = %self.parent.name(), skipped, "Parent records without a usable slice");
        }
        info!(
            parent = %self.parent.name(),
            parent_records = read.stats().records,
            slices = slices.len(),
            "Enumerated parent slices"
        );
        Ok(slices)
    }
}

// ============================================================================
// List Slices
// ============================================================================

/// One slice per value of a fixed list
#[derive(Debug, Clone)]
pub struct ListSlices {
    key: String,
    values: Vec<Value>,
}

impl ListSlices {
    pub fn new(key: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            key: key.into(),
            values,
        }
    }

    /// Create from string values
    pub fn from_strings<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            key,
            values
                .into_iter()
                .map(|v| Value::String(v.into()))
                .collect(),
        )
    }
}

#[async_trait]
impl SliceProvider for ListSlices {
    async fn slices(&self, _state: Option<&StreamState>) -> Result<Vec<Slice>> {
        let mut seen = HashSet::new();
        Ok(self
            .values
            .iter()
            .filter(|v| seen.insert(v.to_string()))
            .map(|v| Slice::from_pairs([(self.key.clone(), v.clone())]))
            .collect())
    }
}
