//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::template::lookup_dotted;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request parameters for the next page.
///
/// Produced from one response and consumed by the next request of the same
/// slice. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCursor {
    /// Query parameters to add or replace
    pub params: BTreeMap<String, Value>,
    /// Verbatim next-page URL, replacing the stream's path
    pub url: Option<String>,
}

impl PageCursor {
    /// Look up a cursor parameter
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    Continue(PageCursor),
    Done,
}

impl NextPage {
    /// Create a continuation with query parameters
    pub fn with_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Continue(PageCursor {
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            url: None,
        })
    }

    /// Create a continuation with a single parameter
    pub fn with_param(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::with_params([(key.into(), value.into())])
    }

    /// Create a continuation with a new URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self::Continue(PageCursor {
            params: BTreeMap::new(),
            url: Some(url.into()),
        })
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn into_cursor(self) -> Option<PageCursor> {
        match self {
            Self::Continue(cursor) => Some(cursor),
            Self::Done => None,
        }
    }
}

/// What a strategy gets to see of one response
#[derive(Debug, Clone, Copy)]
pub struct PageResponse<'a> {
    /// Decoded body; `Null` for an empty response
    pub body: &'a Value,
    pub headers: &'a HeaderMap,
    /// Records extracted from this page
    pub record_count: usize,
}

/// Core trait for pagination strategies.
///
/// Strategies are pure: everything they know about the current position
/// comes from the cursor that produced the response.
pub trait PageCursorStrategy: Send + Sync + std::fmt::Debug {
    /// Parameters sent with every page, including the first (page sizes)
    fn initial_params(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }

    /// Decide what to request next.
    ///
    /// Missing or malformed pagination metadata ends the slice.
    fn next_page(&self, response: &PageResponse<'_>, current: Option<&PageCursor>) -> NextPage;
}

/// Declarative pagination settings, as written in connector definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    #[default]
    None,

    /// Boolean "more pages" flag next to the current page number
    HasMore {
        #[serde(default = "default_has_more_flag")]
        flag_path: String,
        #[serde(default = "default_has_more_page")]
        page_path: String,
        #[serde(default = "default_page_param")]
        page_param: String,
        #[serde(default)]
        page_size_param: Option<String>,
        #[serde(default)]
        page_size: Option<u64>,
    },

    /// Offset and limit, optionally echoed back with a total
    Offset {
        #[serde(default = "default_offset_param")]
        offset_param: String,
        #[serde(default = "default_limit_param")]
        limit_param: String,
        limit: u64,
        /// Where the response reports its own offset
        #[serde(default)]
        offset_path: Option<String>,
        /// Where the response reports the page size it used
        #[serde(default)]
        limit_path: Option<String>,
        #[serde(default)]
        total_path: Option<String>,
        /// Highest offset the API will serve
        #[serde(default)]
        max_offset: Option<u64>,
        /// Send the limit on every request
        #[serde(default = "default_true")]
        send_limit: bool,
    },

    /// A total/limit/page triple, optionally under an envelope
    TotalPages {
        #[serde(default)]
        envelope: Option<String>,
        #[serde(default = "default_total_field")]
        total_field: String,
        #[serde(default = "default_limit_param")]
        limit_field: String,
        #[serde(default = "default_page_param")]
        page_field: String,
        #[serde(default = "default_page_param")]
        page_param: String,
        #[serde(default = "default_limit_param")]
        limit_param: String,
        #[serde(default)]
        page_size: Option<u64>,
    },

    /// Page number counted by the client
    PageNumber {
        #[serde(default = "default_page_param")]
        page_param: String,
        #[serde(default = "default_start_page")]
        start_page: u64,
        #[serde(default)]
        page_size_param: Option<String>,
        #[serde(default)]
        page_size: Option<u64>,
    },

    /// Opaque continuation token from the body
    NextToken {
        token_path: String,
        token_param: String,
        #[serde(default)]
        page_size_param: Option<String>,
        #[serde(default)]
        page_size: Option<u64>,
    },

    /// Absolute next-page URL from the body
    NextUrl { path: String },

    /// RFC 5988 `Link` header
    LinkHeader {
        #[serde(default = "default_rel")]
        rel: String,
    },
}

fn default_has_more_flag() -> String {
    "paging.has_next_page".to_string()
}
fn default_has_more_page() -> String {
    "paging.page".to_string()
}
fn default_page_param() -> String {
    "page".to_string()
}
fn default_offset_param() -> String {
    "offset".to_string()
}
fn default_limit_param() -> String {
    "limit".to_string()
}
fn default_total_field() -> String {
    "total".to_string()
}
fn default_start_page() -> u64 {
    1
}
fn default_rel() -> String {
    "next".to_string()
}
fn default_true() -> bool {
    true
}

/// Read a non-negative integer that may be encoded as a number or a string
pub fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a count at a dot path (`$.` prefix allowed)
pub fn count_at(body: &Value, path: &str) -> Option<u64> {
    lookup_dotted(body, path.strip_prefix("$.").unwrap_or(path)).and_then(as_count)
}
