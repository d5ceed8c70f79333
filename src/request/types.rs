//! Outbound request description

use crate::types::Method;
use serde_json::Value;
use std::collections::BTreeMap;

/// One fully rendered request, ready for the HTTP client.
///
/// `path` is either relative to the client's base URL or an absolute URL
/// (next-page links).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, Value>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
