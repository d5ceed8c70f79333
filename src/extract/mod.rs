//! Record extraction module
//!
//! Turns a response body into the records it carries. The response shape is
//! fixed per stream: a list under an optional envelope, or a single object.
//! Empty responses (204 or a blank body) yield no records.

mod extractor;
mod types;

pub use extractor::JsonExtractor;
pub use types::{FieldTransform, RecordExtractor, ResponseShape};
