//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{
    as_count, count_at, NextPage, PageCursor, PageCursorStrategy, PageResponse, PaginationConfig,
};
use crate::template::lookup_dotted;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

fn page_size_params(param: Option<&String>, size: Option<u64>) -> BTreeMap<String, Value> {
    let mut params = BTreeMap::new();
    if let (Some(param), Some(size)) = (param, size) {
        params.insert(param.clone(), Value::from(size));
    }
    params
}

/// Position recorded in the cursor that produced the current page
fn cursor_count(current: Option<&PageCursor>, param: &str) -> Option<u64> {
    current.and_then(|c| c.param(param)).and_then(as_count)
}

// ============================================================================
// No Pagination
// ============================================================================

/// Single request per slice
#[derive(Debug, Clone, Default)]
pub struct NoPagination;

impl PageCursorStrategy for NoPagination {
    fn next_page(&self, _response: &PageResponse<'_>, _current: Option<&PageCursor>) -> NextPage {
        NextPage::Done
    }
}

// ============================================================================
// Has-More Pagination
// ============================================================================

/// Boolean "has next page" flag plus the page number the server just served.
///
/// `{"paging": {"has_next_page": true, "page": 3}}` continues with `page=4`.
/// Only a literal `true` continues.
#[derive(Debug, Clone)]
pub struct HasMorePagination {
    pub flag_path: String,
    pub page_path: String,
    pub page_param: String,
    pub page_size_param: Option<String>,
    pub page_size: Option<u64>,
}

impl HasMorePagination {
    pub fn new(flag_path: impl Into<String>, page_path: impl Into<String>) -> Self {
        Self {
            flag_path: flag_path.into(),
            page_path: page_path.into(),
            page_param: "page".to_string(),
            page_size_param: None,
            page_size: None,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: u64) -> Self {
        self.page_size_param = Some(param.into());
        self.page_size = Some(size);
        self
    }
}

impl PageCursorStrategy for HasMorePagination {
    fn initial_params(&self) -> BTreeMap<String, Value> {
        page_size_params(self.page_size_param.as_ref(), self.page_size)
    }

    fn next_page(&self, response: &PageResponse<'_>, current: Option<&PageCursor>) -> NextPage {
        if lookup_dotted(response.body, &self.flag_path) != Some(&Value::Bool(true)) {
            return NextPage::Done;
        }

        let page = count_at(response.body, &self.page_path)
            .or_else(|| cursor_count(current, &self.page_param));

        match page.and_then(|page| page.checked_add(1)) {
            Some(next) => NextPage::with_param(&self.page_param, next),
            None => NextPage::Done,
        }
    }
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset and limit pagination.
///
/// The current offset comes from the response when the API echoes it back
/// (`meta.pagination.offset`, SCIM `startIndex`), otherwise from the cursor.
/// Stops on a short page, when the next offset reaches the reported total,
/// or when it would pass `max_offset`.
#[derive(Debug, Clone)]
pub struct OffsetPagination {
    pub offset_param: String,
    pub limit_param: String,
    pub limit: u64,
    pub offset_path: Option<String>,
    pub limit_path: Option<String>,
    pub total_path: Option<String>,
    pub max_offset: Option<u64>,
    pub send_limit: bool,
}

impl OffsetPagination {
    pub fn new(offset_param: impl Into<String>, limit_param: impl Into<String>, limit: u64) -> Self {
        Self {
            offset_param: offset_param.into(),
            limit_param: limit_param.into(),
            limit,
            offset_path: None,
            limit_path: None,
            total_path: None,
            max_offset: None,
            send_limit: true,
        }
    }

    /// Read offset, limit and total from the response body
    #[must_use]
    pub fn with_metadata(
        mut self,
        offset_path: impl Into<String>,
        limit_path: impl Into<String>,
        total_path: impl Into<String>,
    ) -> Self {
        self.offset_path = Some(offset_path.into());
        self.limit_path = Some(limit_path.into());
        self.total_path = Some(total_path.into());
        self
    }

    #[must_use]
    pub fn with_max_offset(mut self, max_offset: u64) -> Self {
        self.max_offset = Some(max_offset);
        self
    }
}

impl PageCursorStrategy for OffsetPagination {
    fn initial_params(&self) -> BTreeMap<String, Value> {
        let mut params = BTreeMap::new();
        if self.send_limit {
            params.insert(self.limit_param.clone(), Value::from(self.limit));
        }
        params
    }

    fn next_page(&self, response: &PageResponse<'_>, current: Option<&PageCursor>) -> NextPage {
        if response.record_count == 0 {
            return NextPage::Done;
        }

        let offset = match &self.offset_path {
            Some(path) => match count_at(response.body, path) {
                Some(offset) => offset,
                None => return NextPage::Done,
            },
            None => cursor_count(current, &self.offset_param).unwrap_or(0),
        };
        let limit = self
            .limit_path
            .as_deref()
            .and_then(|path| count_at(response.body, path))
            .unwrap_or(self.limit);

        if limit == 0 || (response.record_count as u64) < limit {
            return NextPage::Done;
        }

        let Some(next) = offset.checked_add(limit) else {
            return NextPage::Done;
        };
        if let Some(path) = &self.total_path {
            match count_at(response.body, path) {
                Some(total) if next < total => {}
                _ => return NextPage::Done,
            }
        }
        if self.max_offset.is_some_and(|max| next > max) {
            return NextPage::Done;
        }

        let mut params = vec![(self.offset_param.clone(), Value::from(next))];
        if self.send_limit {
            params.push((self.limit_param.clone(), Value::from(self.limit)));
        }
        NextPage::with_params(params)
    }
}

// ============================================================================
// Total Pages Pagination
// ============================================================================

/// Page numbers derived from a `total`/`limit`/`page` triple.
///
/// The last page is `ceil(total / limit)`. A total below one page stops
/// immediately: `{"total": 80, "limit": 100, "page": 1}` is a single page.
#[derive(Debug, Clone)]
pub struct TotalPagesPagination {
    pub envelope: Option<String>,
    pub total_field: String,
    pub limit_field: String,
    pub page_field: String,
    pub page_param: String,
    pub limit_param: String,
    pub page_size: Option<u64>,
}

impl TotalPagesPagination {
    pub fn new(page_param: impl Into<String>, limit_param: impl Into<String>) -> Self {
        Self {
            envelope: None,
            total_field: "total".to_string(),
            limit_field: "limit".to_string(),
            page_field: "page".to_string(),
            page_param: page_param.into(),
            limit_param: limit_param.into(),
            page_size: None,
        }
    }

    /// Read the triple from beneath this path
    #[must_use]
    pub fn with_envelope(mut self, envelope: impl Into<String>) -> Self {
        self.envelope = Some(envelope.into());
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, size: u64) -> Self {
        self.page_size = Some(size);
        self
    }
}

impl PageCursorStrategy for TotalPagesPagination {
    fn initial_params(&self) -> BTreeMap<String, Value> {
        page_size_params(Some(&self.limit_param), self.page_size)
    }

    fn next_page(&self, response: &PageResponse<'_>, _current: Option<&PageCursor>) -> NextPage {
        let meta = match &self.envelope {
            Some(path) => match lookup_dotted(response.body, path) {
                Some(meta) => meta,
                None => return NextPage::Done,
            },
            None => response.body,
        };

        let field = |name: &str| meta.get(name).and_then(as_count);
        let (Some(total), Some(limit), Some(page)) = (
            field(&self.total_field),
            field(&self.limit_field),
            field(&self.page_field),
        ) else {
            return NextPage::Done;
        };

        if limit == 0 || total < limit {
            return NextPage::Done;
        }

        let last_page = total.div_ceil(limit);
        match page.checked_add(1) {
            Some(next) if page < last_page => NextPage::with_params([
                (self.page_param.clone(), Value::from(next)),
                (self.limit_param.clone(), Value::from(limit)),
            ]),
            _ => NextPage::Done,
        }
    }
}

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination counted by the client.
///
/// Stops on an empty page, or on a page shorter than the page size.
#[derive(Debug, Clone)]
pub struct PageNumberPagination {
    pub page_param: String,
    /// First page number (usually 0 or 1)
    pub start_page: u64,
    pub page_size_param: Option<String>,
    pub page_size: Option<u64>,
}

impl PageNumberPagination {
    pub fn new(page_param: impl Into<String>, start_page: u64) -> Self {
        Self {
            page_param: page_param.into(),
            start_page,
            page_size_param: None,
            page_size: None,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: u64) -> Self {
        self.page_size_param = Some(param.into());
        self.page_size = Some(size);
        self
    }
}

impl PageCursorStrategy for PageNumberPagination {
    fn initial_params(&self) -> BTreeMap<String, Value> {
        let mut params = page_size_params(self.page_size_param.as_ref(), self.page_size);
        params.insert(self.page_param.clone(), Value::from(self.start_page));
        params
    }

    fn next_page(&self, response: &PageResponse<'_>, current: Option<&PageCursor>) -> NextPage {
        if response.record_count == 0 {
            return NextPage::Done;
        }
        if let Some(size) = self.page_size {
            if (response.record_count as u64) < size {
                return NextPage::Done;
            }
        }

        let page = cursor_count(current, &self.page_param).unwrap_or(self.start_page);
        match page.checked_add(1) {
            Some(next) => NextPage::with_param(&self.page_param, next),
            None => NextPage::Done,
        }
    }
}

// ============================================================================
// Next Token Pagination
// ============================================================================

/// Opaque continuation token, e.g. `NextToken`
#[derive(Debug, Clone)]
pub struct NextTokenPagination {
    pub token_path: String,
    pub token_param: String,
    pub page_size_param: Option<String>,
    pub page_size: Option<u64>,
}

impl NextTokenPagination {
    pub fn new(token_path: impl Into<String>, token_param: impl Into<String>) -> Self {
        Self {
            token_path: token_path.into(),
            token_param: token_param.into(),
            page_size_param: None,
            page_size: None,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, param: impl Into<String>, size: u64) -> Self {
        self.page_size_param = Some(param.into());
        self.page_size = Some(size);
        self
    }
}

impl PageCursorStrategy for NextTokenPagination {
    fn initial_params(&self) -> BTreeMap<String, Value> {
        page_size_params(self.page_size_param.as_ref(), self.page_size)
    }

    fn next_page(&self, response: &PageResponse<'_>, _current: Option<&PageCursor>) -> NextPage {
        match lookup_dotted(response.body, &self.token_path) {
            Some(Value::String(token)) if !token.is_empty() => {
                NextPage::with_param(&self.token_param, token.clone())
            }
            _ => NextPage::Done,
        }
    }
}

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Next URL pagination (URL in response body)
///
/// - `{ "next": "https://api.example.com/items?page=2" }`
/// - `{ "paging": { "next": "..." } }`
#[derive(Debug, Clone)]
pub struct NextUrlPagination {
    pub path: String,
}

impl NextUrlPagination {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl PageCursorStrategy for NextUrlPagination {
    fn next_page(&self, response: &PageResponse<'_>, _current: Option<&PageCursor>) -> NextPage {
        match lookup_dotted(response.body, &self.path) {
            Some(Value::String(url)) if !url.is_empty() => NextPage::with_url(url.clone()),
            _ => NextPage::Done,
        }
    }
}

// ============================================================================
// Link Header Pagination
// ============================================================================

/// Link header pagination (RFC 5988)
///
/// Format: `Link: <https://api.example.com/...?page=2>; rel="next", ...`
#[derive(Debug, Clone)]
pub struct LinkHeaderPagination {
    /// Rel value to follow (default: "next")
    pub rel: String,
}

impl Default for LinkHeaderPagination {
    fn default() -> Self {
        Self {
            rel: "next".to_string(),
        }
    }
}

impl PageCursorStrategy for LinkHeaderPagination {
    fn next_page(&self, response: &PageResponse<'_>, _current: Option<&PageCursor>) -> NextPage {
        response
            .headers
            .get("link")
            .and_then(|v| v.to_str().ok())
            .and_then(|header| parse_link_header(header, &self.rel))
            .map_or(NextPage::Done, NextPage::with_url)
    }
}

/// Parse a Link header and extract the URL for the given rel
pub fn parse_link_header(header: &str, target_rel: &str) -> Option<String> {
    for part in header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';').map(str::trim) {
            if let Some(inner) = segment.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
                url = Some(inner);
            } else if let Some(value) = segment.strip_prefix("rel=") {
                rel = Some(value.trim_matches('"').trim_matches('\''));
            }
        }

        if let (Some(u), Some(r)) = (url, rel) {
            if r.split_whitespace().any(|r| r == target_rel) {
                return Some(u.to_string());
            }
        }
    }

    None
}

// ============================================================================
// Construction from definitions
// ============================================================================

impl PaginationConfig {
    /// Build the strategy these settings describe
    pub fn build(&self) -> Arc<dyn PageCursorStrategy> {
        match self.clone() {
            PaginationConfig::None => Arc::new(NoPagination),
            PaginationConfig::HasMore {
                flag_path,
                page_path,
                page_param,
                page_size_param,
                page_size,
            } => Arc::new(HasMorePagination {
                flag_path,
                page_path,
                page_param,
                page_size_param,
                page_size,
            }),
            PaginationConfig::Offset {
                offset_param,
                limit_param,
                limit,
                offset_path,
                limit_path,
                total_path,
                max_offset,
                send_limit,
            } => Arc::new(OffsetPagination {
                offset_param,
                limit_param,
                limit,
                offset_path,
                limit_path,
                total_path,
                max_offset,
                send_limit,
            }),
            PaginationConfig::TotalPages {
                envelope,
                total_field,
                limit_field,
                page_field,
                page_param,
                limit_param,
                page_size,
            } => Arc::new(TotalPagesPagination {
                envelope,
                total_field,
                limit_field,
                page_field,
                page_param,
                limit_param,
                page_size,
            }),
            PaginationConfig::PageNumber {
                page_param,
                start_page,
                page_size_param,
                page_size,
            } => Arc::new(PageNumberPagination {
                page_param,
                start_page,
                page_size_param,
                page_size,
            }),
            PaginationConfig::NextToken {
                token_path,
                token_param,
                page_size_param,
                page_size,
            } => Arc::new(NextTokenPagination {
                token_path,
                token_param,
                page_size_param,
                page_size,
            }),
            PaginationConfig::NextUrl { path } => Arc::new(NextUrlPagination { path }),
            PaginationConfig::LinkHeader { rel } => Arc::new(LinkHeaderPagination { rel }),
        }
    }
}
