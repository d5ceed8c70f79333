//! Pagination module
//!
//! Supports: has-more flags, offset/limit, total/limit/page triples, page
//! numbers, continuation tokens, next URLs and Link headers.
//!
//! # Overview
//!
//! A strategy turns one response into the parameters for the next request.
//! Strategies hold no position of their own: the read loop passes back the
//! cursor that produced each page, so one strategy instance serves every
//! slice of a stream.

mod strategies;
mod types;

pub use strategies::{
    parse_link_header, HasMorePagination, LinkHeaderPagination, NextTokenPagination,
    NextUrlPagination, NoPagination, OffsetPagination, PageNumberPagination,
    TotalPagesPagination,
};
pub use types::{
    as_count, count_at, NextPage, PageCursor, PageCursorStrategy, PageResponse, PaginationConfig,
};
