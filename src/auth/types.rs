//! Auth configuration types
//!
//! These types represent the runtime auth configuration after template
//! interpolation has been applied.

use crate::types::JwtAlgorithm;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a credential is attached to the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    #[default]
    Header,
    Query,
}

/// How a session login hands back its credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCredential {
    /// Token read from the login response body, sent in a header
    Token {
        /// Dot path to the token in the login response
        path: String,
        header: String,
        prefix: Option<String>,
    },
    /// `Set-Cookie` values from the login response, replayed as `Cookie`
    Cookie,
}

/// Second login step for accounts behind two-factor validation.
///
/// Runs when the login response flags validation as required: the user id
/// from that response is posted with a TOTP code, and the credential is read
/// from the validation response instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpStep {
    pub url: String,
    /// Base32 TOTP secret
    pub secret: Option<String>,
    /// Dot path to the boolean asking for validation
    pub required_path: String,
    /// Dot path to the user id sent back with the code
    pub uid_path: String,
}

impl OtpStep {
    /// Whether a login response asks for the second step
    pub fn is_required(&self, login_response: &serde_json::Value) -> bool {
        crate::template::lookup_dotted(login_response, &self.required_path)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Authentication configuration (after template interpolation)
#[derive(Debug, Clone, Default)]
pub enum AuthConfig {
    #[default]
    None,

    /// Static key in a header or query parameter
    ApiKey {
        location: Location,
        /// Header or query parameter name
        name: String,
        /// Prefix added before the value (e.g. "Token ")
        prefix: Option<String>,
        value: String,
    },

    /// HTTP Basic authentication
    Basic { username: String, password: String },

    /// Bearer token authentication
    Bearer { token: String },

    /// Several credentials passed as query parameters on every request
    QueryParams { params: BTreeMap<String, String> },

    /// OAuth2 client credentials grant.
    ///
    /// There is no refresh token: an expired token is replaced by running
    /// the grant again.
    Oauth2ClientCredentials {
        token_url: String,
        client_id: String,
        client_secret: String,
        scopes: Vec<String>,
        /// Additional token request form fields
        token_body: BTreeMap<String, String>,
    },

    /// OAuth2 refresh token grant
    Oauth2Refresh {
        token_url: String,
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },

    /// Log in once and reuse the session
    Session {
        login_url: String,
        login_body: serde_json::Value,
        credential: SessionCredential,
        /// Session lifetime, when the API documents one
        lifetime_seconds: Option<i64>,
        otp: Option<OtpStep>,
    },

    /// Client credentials grant authenticated with a signed JWT assertion.
    ///
    /// The private key may be given as PEM or as base64-encoded PEM.
    JwtAssertion {
        token_url: String,
        client_id: String,
        key_id: Option<String>,
        private_key: String,
        audience: String,
        scope: Option<String>,
        algorithm: JwtAlgorithm,
        lifetime_seconds: i64,
    },

    /// Fixed headers added to each request
    CustomHeaders { headers: BTreeMap<String, String> },

    /// AWS Signature Version 4, computed per request
    AwsSigv4 {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
        region: String,
        /// Signing name of the service, e.g. `quicksight`
        service: String,
    },
}

impl AuthConfig {
    /// Whether this auth type obtains a token at run time
    pub fn uses_token(&self) -> bool {
        matches!(
            self,
            AuthConfig::Oauth2ClientCredentials { .. }
                | AuthConfig::Oauth2Refresh { .. }
                | AuthConfig::Session { .. }
                | AuthConfig::JwtAssertion { .. }
        )
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::ApiKey { .. } => "api_key",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::QueryParams { .. } => "query_params",
            AuthConfig::Oauth2ClientCredentials { .. } => "oauth2_client_credentials",
            AuthConfig::Oauth2Refresh { .. } => "oauth2_refresh",
            AuthConfig::Session { .. } => "session",
            AuthConfig::JwtAssertion { .. } => "jwt_assertion",
            AuthConfig::CustomHeaders { .. } => "custom_headers",
            AuthConfig::AwsSigv4 { .. } => "aws_sigv4",
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        Self {
            token,
            expires_at: Some(Utc::now() + chrono::Duration::seconds(seconds)),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(30) >= expires_at,
            None => false,
        }
    }
}
