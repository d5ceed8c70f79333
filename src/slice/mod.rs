//! Slicing module
//!
//! Supports: parent stream projections and static value lists.
//!
//! # Overview
//!
//! A slice is the key/value context of one pass of a stream's read loop,
//! such as the parent id a child endpoint is scoped to. Slices are
//! enumerated fresh for every read, de-duplicated in first-seen order, and
//! read one after another.

mod providers;
mod types;

pub use providers::{ListSlices, ParentSlices};
pub use types::{Slice, SliceConfig, SliceExclusion, SliceProjection, SliceProvider};
