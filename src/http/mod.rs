//! HTTP client module
//!
//! Provides the HTTP client shared by all streams of a sync run.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Authentication**: Credentials applied per request, tokens refreshed on 401

mod client;
mod rate_limit;

pub use client::{join_url, query_pairs, HttpClient, HttpClientConfig, HttpClientConfigBuilder, HttpResponse};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
