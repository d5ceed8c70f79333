//! Common types used throughout Tributary CDK
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

// ============================================================================
// Sync Mode
// ============================================================================

/// Synchronization mode for streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full refresh - fetch all data every time
    #[default]
    FullRefresh,
    /// Incremental - only fetch new/updated data
    Incremental,
}

// ============================================================================
// Log Level
// ============================================================================

/// Log level for connector messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// ============================================================================
// Cursor Format
// ============================================================================

/// Format for cursor values in incremental sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorFormat {
    /// ISO 8601 datetime string
    #[default]
    Iso8601,
    /// Unix timestamp (seconds)
    Unix,
    /// Unix timestamp (milliseconds)
    UnixMs,
    /// Plain string (no conversion)
    String,
}

impl CursorFormat {
    /// Parse a raw cursor value into a comparable form.
    ///
    /// Returns `None` for values that do not match the format, such as a
    /// date string that fails to parse or a `null`.
    pub fn parse(self, value: &JsonValue) -> Option<CursorValue> {
        match self {
            CursorFormat::Iso8601 => match value {
                JsonValue::String(s) => {
                    parse_datetime(s).map(|dt| CursorValue::Number(dt.timestamp_millis() as f64))
                }
                // Numbers under the default format are epoch seconds
                JsonValue::Number(n) => n.as_f64().map(|secs| CursorValue::Number(secs * 1000.0)),
                _ => None,
            },
            CursorFormat::Unix | CursorFormat::UnixMs => match value {
                JsonValue::Number(n) => n.as_f64().map(CursorValue::Number),
                JsonValue::String(s) => s.trim().parse::<f64>().ok().map(CursorValue::Number),
                _ => None,
            },
            CursorFormat::String => match value {
                JsonValue::String(s) => Some(CursorValue::Text(s.clone())),
                JsonValue::Number(n) => n.as_f64().map(CursorValue::Number),
                _ => None,
            },
        }
    }

    /// Convert a raw value in this format into unix epoch seconds
    pub fn to_epoch_seconds(self, value: &JsonValue) -> Option<i64> {
        match self {
            CursorFormat::Iso8601 => match value {
                JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                _ => value.as_str().and_then(parse_datetime).map(|dt| dt.timestamp()),
            },
            CursorFormat::Unix => value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f as i64))
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok())),
            CursorFormat::UnixMs => value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .map(|ms: i64| ms / 1000),
            CursorFormat::String => None,
        }
    }
}

/// A cursor value reduced to something totally ordered within one format
#[derive(Debug, Clone, PartialEq)]
pub enum CursorValue {
    Number(f64),
    Text(String),
}

impl PartialOrd for CursorValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (CursorValue::Number(a), CursorValue::Number(b)) => a.partial_cmp(b),
            (CursorValue::Text(a), CursorValue::Text(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Parse the datetime shapes APIs commonly return.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`
/// (read as UTC) and bare dates.
pub fn parse_datetime(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

    let s = s.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// JWT Algorithm
// ============================================================================

/// JWT signing algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// RSA using SHA-256
    #[default]
    RS256,
    /// RSA using SHA-384
    RS384,
    /// RSA using SHA-512
    RS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
}

impl From<JwtAlgorithm> for jsonwebtoken::Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JwtAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            JwtAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
            JwtAlgorithm::RS256 => jsonwebtoken::Algorithm::RS256,
            JwtAlgorithm::RS384 => jsonwebtoken::Algorithm::RS384,
            JwtAlgorithm::RS512 => jsonwebtoken::Algorithm::RS512,
            JwtAlgorithm::ES256 => jsonwebtoken::Algorithm::ES256,
            JwtAlgorithm::ES384 => jsonwebtoken::Algorithm::ES384,
        }
    }
}
