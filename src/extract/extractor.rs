//! JSON record extraction

use super::types::{FieldTransform, RecordExtractor, ResponseShape};
use crate::error::{Error, Result};
use crate::http::HttpResponse;
use crate::slice::Slice;
use crate::template::{lookup, lookup_dotted};
use crate::types::JsonObject;
use serde_json::Value;
use tracing::warn;

/// Extracts records from a JSON body by shape, then applies transforms
#[derive(Debug, Clone, Default)]
pub struct JsonExtractor {
    shape: ResponseShape,
    transforms: Vec<FieldTransform>,
}

impl JsonExtractor {
    pub fn new(shape: ResponseShape) -> Self {
        Self {
            shape,
            transforms: Vec::new(),
        }
    }

    /// Records are the elements of an array at `path`
    pub fn list(path: impl Into<String>) -> Self {
        Self::new(ResponseShape::list(path))
    }

    /// The response is one record
    pub fn single() -> Self {
        Self::new(ResponseShape::single(None))
    }

    #[must_use]
    pub fn with_transforms(mut self, transforms: Vec<FieldTransform>) -> Self {
        self.transforms.extend(transforms);
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: FieldTransform) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn shape(&self) -> &ResponseShape {
        &self.shape
    }

    /// Pull the raw records out of a decoded body
    pub fn records_from(&self, body: &Value) -> Result<Vec<JsonObject>> {
        let target = match self.shape.path() {
            Some(path) => lookup_dotted(body, path.strip_prefix("$.").unwrap_or(path)),
            None => Some(body),
        };
        let Some(target) = target.filter(|v| !v.is_null()) else {
            return Ok(Vec::new());
        };

        match (&self.shape, target) {
            (ResponseShape::List { scalar_key, .. }, Value::Array(items)) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match (item, scalar_key) {
                        (Value::Object(obj), _) => records.push(obj.clone()),
                        (Value::Null, _) => {}
                        (scalar, Some(key)) => {
                            let mut obj = JsonObject::new();
                            obj.insert(key.clone(), scalar.clone());
                            records.push(obj);
                        }
                        (other, None) => {
                            warn!(value = %other, "Skipping non-object entry in record list");
                        }
                    }
                }
                Ok(records)
            }
            (ResponseShape::Single { .. }, Value::Object(obj)) => Ok(vec![obj.clone()]),
            (shape, other) => Err(Error::RecordExtraction {
                path: self.shape.path().unwrap_or("$").to_string(),
                message: format!(
                    "expected {} but found {}",
                    match shape {
                        ResponseShape::List { .. } => "an array",
                        ResponseShape::Single { .. } => "an object",
                    },
                    kind_of(other)
                ),
            }),
        }
    }

    fn apply(&self, record: &mut JsonObject, response: &HttpResponse, slice: &Slice) {
        for transform in &self.transforms {
            match transform {
                FieldTransform::EpochSeconds { field, format } => {
                    if let Some(value) = record.get(field) {
                        if let Some(epoch) = format.to_epoch_seconds(value) {
                            record.insert(field.clone(), Value::from(epoch));
                        }
                    }
                }
                FieldTransform::Flatten { field, path } => {
                    let parts: Vec<&str> = path.split('.').collect();
                    let nested = record
                        .get(parts[0])
                        .and_then(|head| lookup(head, &parts[1..]))
                        .cloned();
                    if let Some(value) = nested {
                        record.insert(field.clone(), value);
                    }
                }
                FieldTransform::StampSlice { slice_key, field } => {
                    if let Some(value) = slice.get(slice_key) {
                        record.insert(field.clone(), value.clone());
                    }
                }
                FieldTransform::RequestUrl { field } => {
                    record.insert(field.clone(), Value::String(response.url.clone()));
                }
            }
        }
    }
}

impl RecordExtractor for JsonExtractor {
    fn extract(&self, response: &HttpResponse, slice: &Slice) -> Result<Vec<Value>> {
        if response.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.records_from(response.json()?)?;
        Ok(records
            .into_iter()
            .map(|mut record| {
                self.apply(&mut record, response, slice);
                Value::Object(record)
            })
            .collect())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
