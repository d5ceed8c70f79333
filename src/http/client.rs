//! HTTP client with retry and rate limiting
//!
//! Every request a stream issues goes through [`HttpClient::send`], which
//! handles:
//! - Automatic retries with configurable backoff
//! - Rate limiting to prevent API throttling
//! - One re-authentication attempt when a token is rejected with 401
//! - Error classification for retry decisions

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::request::HttpRequest;
use crate::template::value_to_string;
use crate::types::BackoffType;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL that relative request paths are joined onto
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Initial delay for backoff
    pub initial_backoff: Duration,
    /// Maximum delay for backoff
    pub max_backoff: Duration,
    pub backoff_type: BackoffType,
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: BTreeMap::new(),
            user_agent: format!("tributary-cdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set backoff configuration
    #[must_use]
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.backoff_type = backoff_type;
        self.config.initial_backoff = initial;
        self.config.max_backoff = max;
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    #[must_use]
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A fully received response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Final request URL, query string included
    pub url: String,
    pub headers: HeaderMap,
    pub body: String,
    decoded: OnceLock<Value>,
}

impl HttpResponse {
    pub fn new(status: u16, url: impl Into<String>, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            headers,
            body: body.into(),
            decoded: OnceLock::new(),
        }
    }

    /// Whether there is nothing to decode (204 or a blank body)
    pub fn is_empty(&self) -> bool {
        self.status == 204 || self.body.trim().is_empty()
    }

    /// Decode the body as JSON; an empty response decodes to `Null`.
    ///
    /// The body is parsed once and cached.
    pub fn json(&self) -> Result<&Value> {
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }
        let value = if self.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&self.body)
                .map_err(|e| Error::decode(format!("invalid JSON from {}: {e}", self.url)))?
        };
        Ok(self.decoded.get_or_init(|| value))
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    authenticator: Option<Authenticator>,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            authenticator: None,
            rate_limiter,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, auth_config: AuthConfig) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        if !matches!(auth_config, AuthConfig::None) {
            client.authenticator = Some(Authenticator::with_client(
                auth_config,
                client.client.clone(),
            ));
        }
        Ok(client)
    }

    pub fn authenticator(&self) -> Option<&Authenticator> {
        self.authenticator.as_ref()
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Send one logical request, retrying transient failures.
    ///
    /// Returns the response for any 2xx status. 4xx and exhausted 5xx
    /// responses become [`Error::HttpStatus`] with the body attached.
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let full_url = self.build_url(&request.path)?;
        let max_retries = self.config.max_retries;

        let mut last_error = None;
        let mut attempt = 0;
        let mut reauthenticated = false;

        while attempt <= max_retries {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }

            let req = self.prepare(request, &full_url).await?;

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::UNAUTHORIZED && !reauthenticated {
                        if let Some(auth) = self.authenticator.as_ref().filter(|a| a.config().uses_token()) {
                            warn!(url = %full_url, "Token rejected (401), re-authenticating");
                            auth.invalidate().await;
                            reauthenticated = true;
                            continue;
                        }
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = extract_retry_after(response.headers());
                        if attempt < max_retries {
                            warn!(
                                "Rate limited (429), attempt {}/{}, waiting {}s",
                                attempt + 1,
                                max_retries + 1,
                                retry_after
                            );
                            tokio::time::sleep(Duration::from_secs(retry_after)).await;
                            attempt += 1;
                            continue;
                        }
                        return Err(Error::RateLimited {
                            retry_after_seconds: retry_after,
                        });
                    }

                    if is_retryable_status(status) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Request failed with {}, attempt {}/{}, retrying in {:?}",
                            status.as_u16(),
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::http_status(status.as_u16(), ""));
                        continue;
                    }

                    let url = response.url().to_string();
                    let headers = response.headers().clone();
                    let body = response.text().await?;

                    if status.is_client_error() || status.is_server_error() {
                        return Err(Error::http_status(status.as_u16(), body));
                    }

                    debug!(method = ?request.method, url = %url, status = status.as_u16(), "Request succeeded");
                    return Ok(HttpResponse::new(status.as_u16(), url, headers, body));
                }
                Err(e) => {
                    if (e.is_timeout() || e.is_connect()) && attempt < max_retries {
                        let delay = self.calculate_backoff(attempt);
                        warn!(
                            "Transport error ({e}), attempt {}/{}, retrying in {:?}",
                            attempt + 1,
                            max_retries + 1,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        last_error = Some(Error::Http(e));
                        continue;
                    }
                    if e.is_timeout() {
                        return Err(Error::Timeout {
                            timeout_ms: self.config.timeout.as_millis() as u64,
                        });
                    }
                    return Err(Error::Http(e));
                }
            }
        }

        Err(last_error.unwrap_or(Error::MaxRetriesExceeded { max_retries }))
    }

    /// Build a reqwest request with headers, query, body and credentials
    async fn prepare(&self, request: &HttpRequest, url: &Url) -> Result<reqwest::RequestBuilder> {
        let mut req = self.client.request(request.method.into(), url.clone());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let query = query_pairs(&request.params);
        if !query.is_empty() {
            req = req.query(&query);
        }

        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        if let Some(ref auth) = self.authenticator {
            req = auth.apply(req).await?;
        }
        Ok(req)
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Resolve a request path against the configured base URL
    pub fn build_url(&self, path: &str) -> Result<Url> {
        join_url(self.config.base_url.as_deref(), path)
    }

    /// Calculate backoff delay for a given attempt
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let delay = match self.config.backoff_type {
            BackoffType::Constant => self.config.initial_backoff,
            BackoffType::Linear => self.config.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.config.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.config.max_backoff)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Flatten request params into query pairs.
///
/// Arrays repeat the key once per element; nulls are dropped.
pub fn query_pairs(params: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|v| !v.is_null()) {
                    pairs.push((key.clone(), value_to_string(item)));
                }
            }
            other => pairs.push((key.clone(), value_to_string(other))),
        }
    }
    pairs
}

/// Check if an HTTP status is retryable
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Resolve a path against a base URL.
///
/// Absolute `http(s)` URLs pass through. Otherwise the path is appended to
/// the base, keeping any path prefix the base already has.
pub fn join_url(base: Option<&str>, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(Url::parse(path)?);
    }
    let Some(base) = base else {
        return Ok(Url::parse(path)?);
    };
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Ok(Url::parse(base.trim_end_matches('/'))?);
    }
    let base = Url::parse(&format!("{}/", base.trim_end_matches('/')))?;
    Ok(base.join(&format!("./{path}"))?)
}

/// Extract retry-after header value
fn extract_retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or(60)
}
