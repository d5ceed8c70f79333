//! Request building
//!
//! A [`RequestBuilder`] renders the next outbound request from the stream's
//! checkpoint, the current slice and the page cursor. It holds no mutable
//! state, so the same builder serves every slice and page.

mod builder;
mod types;

pub use builder::{RequestBuilder, RequestTemplate, StateParam};
pub use types::HttpRequest;
