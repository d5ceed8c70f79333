//! State management module
//!
//! Handles cursor tracking, checkpointing, and resumability.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! - `State` / `StreamState` - the persisted checkpoint document
//! - `CursorReducer` - monotonic checkpoint advance and staleness filter
//! - `StateManager` - file-backed persistence with atomic writes

mod manager;
mod reducer;
mod types;

pub use manager::StateManager;
pub use reducer::CursorReducer;
pub use types::{State, StreamState};

#[cfg(test)]
mod tests;
