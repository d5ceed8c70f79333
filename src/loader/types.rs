//! Loader types
//!
//! Declarative connector definition types for YAML parsing.

use crate::auth::{AuthConfig, Location, OtpStep, SessionCredential};
use crate::error::{Error, Result};
use crate::extract::{FieldTransform, ResponseShape};
use crate::pagination::PaginationConfig;
use crate::request::StateParam;
use crate::slice::SliceConfig;
use crate::stream::IncrementalConfig;
use crate::template::{self, TemplateContext};
use crate::types::{BackoffType, JwtAlgorithm, Method};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ============================================================================
// Connector Definition
// ============================================================================

/// Top-level connector definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectorDefinition {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Base URL for all requests (may reference `config.*`)
    pub base_url: String,
    /// User configuration fields
    #[serde(default)]
    pub config: Vec<ConfigFieldDefinition>,
    #[serde(default)]
    pub auth: AuthDefinition,
    #[serde(default)]
    pub http: HttpDefinition,
    /// Connection check configuration
    #[serde(default)]
    pub check: Option<CheckDefinition>,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub streams: Vec<StreamDefinition>,
}

impl ConnectorDefinition {
    /// Names of the config fields that must be present and non-empty
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.config
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
    }

    pub fn stream(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    pub fn stream_names(&self) -> Vec<&str> {
        self.streams.iter().map(|s| s.name.as_str()).collect()
    }

    /// Check the user config against the declared fields.
    ///
    /// Missing, null and empty-string values all count as absent.
    pub fn validate_config(&self, config: &Value) -> Result<()> {
        if !config.is_object() && !config.is_null() {
            return Err(Error::config("Config must be a JSON object"));
        }
        for field in self.required_fields() {
            let present = match config.get(field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(Error::missing_field(field));
            }
        }
        for field in &self.config {
            if let Some(value) = config.get(&field.name).filter(|v| !v.is_null()) {
                field.check_type(value)?;
            }
        }
        Ok(())
    }

    /// Fill in declared defaults for fields the user left out
    pub fn config_with_defaults(&self, config: &Value) -> Value {
        let mut merged = config.as_object().cloned().unwrap_or_default();
        for field in &self.config {
            if let Some(default) = &field.default {
                merged
                    .entry(field.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
        Value::Object(merged)
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// One user configuration field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFieldDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    /// Masked in logs and spec output
    #[serde(default)]
    pub secret: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
}

fn default_field_type() -> String {
    "string".to_string()
}

impl ConfigFieldDefinition {
    /// Numbers and booleans may also arrive as their string form
    fn check_type(&self, value: &Value) -> Result<()> {
        let ok = match self.field_type.as_str() {
            "integer" => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_str().is_some_and(|s| s.trim().parse::<i64>().is_ok())
            }
            "number" => {
                value.is_number() || value.as_str().is_some_and(|s| s.trim().parse::<f64>().is_ok())
            }
            "boolean" => value.is_boolean() || matches!(value.as_str(), Some("true" | "false")),
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::invalid_value(
                &self.name,
                format!("expected {}, got {value}", self.field_type),
            ))
        }
    }
}

/// Connection check configuration.
///
/// Either reads the first record of a stream or requests a bare path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckDefinition {
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

// ============================================================================
// Auth Definition
// ============================================================================

/// Authentication definition; string fields are templates over `config.*`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthDefinition {
    #[default]
    None,

    ApiKey {
        /// Header or query parameter name
        name: String,
        value: String,
        #[serde(default)]
        location: Location,
        #[serde(default)]
        prefix: Option<String>,
    },

    Basic { username: String, password: String },

    Bearer { token: String },

    QueryParams { params: BTreeMap<String, String> },

    Oauth2ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
        #[serde(default)]
        scopes: Vec<String>,
        #[serde(default)]
        token_body: BTreeMap<String, String>,
    },

    Oauth2Refresh {
        token_url: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },

    /// Log in with a JSON body and reuse the session
    Session {
        /// Absolute URL, or a path joined onto the base URL
        login_url: String,
        login_body: Value,
        /// Login body fields sent URL-safe base64 encoded
        #[serde(default)]
        base64_fields: Vec<String>,
        /// Dot path to the token; without one the session cookie is replayed
        #[serde(default)]
        token_path: Option<String>,
        #[serde(default = "default_auth_header")]
        header: String,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        lifetime_seconds: Option<i64>,
        #[serde(default)]
        otp: Option<OtpDefinition>,
    },

    JwtAssertion {
        token_url: String,
        client_id: String,
        #[serde(default)]
        key_id: Option<String>,
        private_key: String,
        audience: String,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        algorithm: JwtAlgorithm,
        #[serde(default = "default_jwt_lifetime")]
        lifetime_seconds: i64,
    },

    CustomHeaders { headers: BTreeMap<String, String> },

    /// Sign every request with AWS SigV4
    AwsSigv4 {
        access_key_id: String,
        secret_access_key: String,
        region: String,
        service: String,
        #[serde(default)]
        session_token: Option<String>,
    },
}

/// TOTP validation step of a session login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpDefinition {
    /// Absolute URL, or a path joined onto the base URL
    pub url: String,
    /// Base32 secret template. When it names an unset config field the step
    /// is still declared, and a login that asks for it fails.
    pub secret: String,
    pub required_path: String,
    pub uid_path: String,
}

fn default_auth_header() -> String {
    "Authorization".to_string()
}

fn default_jwt_lifetime() -> i64 {
    3600
}

impl AuthDefinition {
    /// Render the templates and produce the runtime auth configuration
    pub fn resolve(&self, ctx: &TemplateContext, base_url: &str) -> Result<AuthConfig> {
        let r = |s: &str| template::render(s, ctx);
        let render_map = |m: &BTreeMap<String, String>| -> Result<BTreeMap<String, String>> {
            m.iter()
                .map(|(k, v)| Ok((k.clone(), template::render(v, ctx)?)))
                .collect()
        };

        Ok(match self {
            AuthDefinition::None => AuthConfig::None,

            AuthDefinition::ApiKey {
                name,
                value,
                location,
                prefix,
            } => AuthConfig::ApiKey {
                location: *location,
                name: name.clone(),
                prefix: prefix.clone(),
                value: r(value)?,
            },

            AuthDefinition::Basic { username, password } => AuthConfig::Basic {
                username: r(username)?,
                password: r(password)?,
            },

            AuthDefinition::Bearer { token } => AuthConfig::Bearer { token: r(token)? },

            AuthDefinition::QueryParams { params } => AuthConfig::QueryParams {
                params: render_map(params)?,
            },

            AuthDefinition::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
                token_body,
            } => AuthConfig::Oauth2ClientCredentials {
                token_url: join_url(base_url, &r(token_url)?)?,
                client_id: r(client_id)?,
                client_secret: r(client_secret)?,
                scopes: scopes.clone(),
                token_body: render_map(token_body)?,
            },

            AuthDefinition::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
            } => AuthConfig::Oauth2Refresh {
                token_url: join_url(base_url, &r(token_url)?)?,
                client_id: r(client_id)?,
                client_secret: r(client_secret)?,
                refresh_token: r(refresh_token)?,
            },

            AuthDefinition::Session {
                login_url,
                login_body,
                base64_fields,
                token_path,
                header,
                prefix,
                lifetime_seconds,
                otp,
            } => {
                let mut body = template::render_value(login_body, ctx)?;
                if let Some(fields) = body.as_object_mut() {
                    for field in base64_fields {
                        if let Some(value) = fields.get_mut(field) {
                            let raw = template::value_to_string(value);
                            *value = Value::String(URL_SAFE.encode(raw.as_bytes()));
                        }
                    }
                }
                let credential = match token_path {
                    Some(path) => SessionCredential::Token {
                        path: path.clone(),
                        header: header.clone(),
                        prefix: prefix.clone(),
                    },
                    None => SessionCredential::Cookie,
                };
                AuthConfig::Session {
                    login_url: join_url(base_url, &r(login_url)?)?,
                    login_body: body,
                    credential,
                    lifetime_seconds: *lifetime_seconds,
                    otp: otp
                        .as_ref()
                        .map(|otp| otp.resolve(ctx, base_url))
                        .transpose()?,
                }
            }

            AuthDefinition::JwtAssertion {
                token_url,
                client_id,
                key_id,
                private_key,
                audience,
                scope,
                algorithm,
                lifetime_seconds,
            } => AuthConfig::JwtAssertion {
                token_url: join_url(base_url, &r(token_url)?)?,
                client_id: r(client_id)?,
                key_id: key_id.as_deref().map(r).transpose()?,
                private_key: r(private_key)?,
                audience: r(audience)?,
                scope: scope.as_deref().map(r).transpose()?,
                algorithm: *algorithm,
                lifetime_seconds: *lifetime_seconds,
            },

            AuthDefinition::CustomHeaders { headers } => AuthConfig::CustomHeaders {
                headers: render_map(headers)?,
            },

            AuthDefinition::AwsSigv4 {
                access_key_id,
                secret_access_key,
                region,
                service,
                session_token,
            } => AuthConfig::AwsSigv4 {
                access_key_id: r(access_key_id)?,
                secret_access_key: r(secret_access_key)?,
                session_token: session_token.as_deref().map(r).transpose()?,
                region: r(region)?,
                service: service.clone(),
            },
        })
    }
}

impl OtpDefinition {
    fn resolve(&self, ctx: &TemplateContext, base_url: &str) -> Result<OtpStep> {
        let secret = match template::render(&self.secret, ctx) {
            Ok(secret) if !secret.trim().is_empty() => Some(secret),
            Ok(_) | Err(Error::UndefinedVariable { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(OtpStep {
            url: join_url(base_url, &template::render(&self.url, ctx)?)?,
            secret,
            required_path: self.required_path.clone(),
            uid_path: self.uid_path.clone(),
        })
    }
}

/// Resolve a possibly relative URL against the connector's base URL
fn join_url(base_url: &str, url: &str) -> Result<String> {
    Ok(crate::http::join_url(Some(base_url), url)?.into())
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub backoff: BackoffType,
    /// Initial retry delay in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_initial_ms: u64,
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
    /// Requests per second; no limiter when absent
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            backoff: BackoffType::default(),
            backoff_initial_ms: default_backoff_ms(),
            backoff_max_secs: default_backoff_max_secs(),
            rate_limit_rps: None,
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_backoff_max_secs() -> u64 {
    60
}

// ============================================================================
// Stream Definition
// ============================================================================

/// Stream definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamDefinition {
    pub name: String,
    #[serde(default)]
    pub primary_key: Option<Vec<String>>,
    pub request: RequestDefinition,
    /// Where records sit in the response
    #[serde(default)]
    pub response: ResponseShape,
    /// Per-record rewrites, applied in order
    #[serde(default)]
    pub transforms: Vec<FieldTransform>,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub slicing: Option<SliceConfig>,
    /// Statuses that end a slice quietly instead of failing the stream
    #[serde(default)]
    pub suppress_http_errors: Vec<u16>,
    #[serde(default)]
    pub incremental: Option<IncrementalConfig>,
}

impl StreamDefinition {
    /// Name of the stream this one is sliced over, if any
    pub fn parent(&self) -> Option<&str> {
        match &self.slicing {
            Some(SliceConfig::Parent { stream, .. }) => Some(stream.as_str()),
            _ => None,
        }
    }
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestDefinition {
    #[serde(default)]
    pub method: Method,
    /// Path template, relative to the base URL
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    /// Query parameter name to slice key
    #[serde(default)]
    pub slice_params: BTreeMap<String, String>,
    #[serde(default)]
    pub state_param: Option<StateParam>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body template
    #[serde(default)]
    pub body: Option<Value>,
}
