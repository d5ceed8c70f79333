//! Authenticator implementation
//!
//! Applies credentials to requests and owns the token cache shared by every
//! stream in a sync run.

use super::types::{AuthConfig, CachedToken, Location, OtpStep, SessionCredential};
use crate::error::{Error, Result};
use crate::template::lookup_dotted;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::debug;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    config: AuthConfig,
    /// Cached token for OAuth2/Session/JWT auth
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, http_client: Client) -> Self {
        Self {
            config,
            cached_token: Arc::new(RwLock::new(None)),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::None => Ok(req),

            AuthConfig::ApiKey {
                location,
                name,
                prefix,
                value,
            } => {
                let val = format!("{}{}", prefix.as_deref().unwrap_or(""), value);
                match location {
                    Location::Header => Ok(req.header(name.as_str(), val)),
                    Location::Query => Ok(req.query(&[(name.as_str(), val)])),
                }
            }

            AuthConfig::Basic { username, password } => {
                Ok(req.basic_auth(username, Some(password)))
            }

            AuthConfig::Bearer { token } => Ok(req.bearer_auth(token)),

            AuthConfig::QueryParams { params } => Ok(req.query(params)),

            AuthConfig::Session { credential, .. } => {
                let token = self.get_or_refresh_token().await?;
                match credential {
                    SessionCredential::Cookie => Ok(req.header(reqwest::header::COOKIE, token)),
                    SessionCredential::Token { header, prefix, .. } => Ok(req.header(
                        header.as_str(),
                        format!("{}{}", prefix.as_deref().unwrap_or(""), token),
                    )),
                }
            }

            AuthConfig::Oauth2ClientCredentials { .. }
            | AuthConfig::Oauth2Refresh { .. }
            | AuthConfig::JwtAssertion { .. } => {
                let token = self.get_or_refresh_token().await?;
                Ok(req.bearer_auth(token))
            }

            AuthConfig::CustomHeaders { headers } => {
                let mut req = req;
                for (key, value) in headers {
                    req = req.header(key.as_str(), value.as_str());
                }
                Ok(req)
            }

            AuthConfig::AwsSigv4 {
                access_key_id,
                secret_access_key,
                session_token,
                region,
                service,
            } => {
                let credentials = Credentials::new(
                    access_key_id,
                    secret_access_key,
                    session_token.clone(),
                    None,
                    "tributary",
                );
                sign_sigv4(req, credentials, region, service)
            }
        }
    }

    /// Get a valid token, refreshing if necessary
    pub async fn get_or_refresh_token(&self) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another caller may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        debug!(auth = self.config.kind(), "Fetching new access token");
        let new_token = self.fetch_new_token().await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Fetch a new token based on auth type
    async fn fetch_new_token(&self) -> Result<CachedToken> {
        match &self.config {
            AuthConfig::Oauth2ClientCredentials {
                token_url,
                client_id,
                client_secret,
                scopes,
                token_body,
            } => {
                let mut form = vec![
                    ("grant_type", "client_credentials".to_string()),
                    ("client_id", client_id.clone()),
                    ("client_secret", client_secret.clone()),
                ];
                if !scopes.is_empty() {
                    form.push(("scope", scopes.join(" ")));
                }
                for (key, value) in token_body {
                    form.push((key.as_str(), value.clone()));
                }
                self.post_token_form(token_url, &form)
                    .await
                    .map_err(|e| Error::OAuth2 {
                        message: e.to_string(),
                    })
            }

            AuthConfig::Oauth2Refresh {
                token_url,
                client_id,
                client_secret,
                refresh_token,
            } => {
                let form = [
                    ("grant_type", "refresh_token".to_string()),
                    ("client_id", client_id.clone()),
                    ("client_secret", client_secret.clone()),
                    ("refresh_token", refresh_token.clone()),
                ];
                self.post_token_form(token_url, &form)
                    .await
                    .map_err(|e| Error::TokenRefresh {
                        message: e.to_string(),
                    })
            }

            AuthConfig::Session {
                login_url,
                login_body,
                credential,
                lifetime_seconds,
                otp,
            } => {
                self.login(login_url, login_body, credential, otp.as_ref(), *lifetime_seconds)
                    .await
            }

            AuthConfig::JwtAssertion {
                token_url,
                client_id,
                key_id,
                private_key,
                audience,
                scope,
                algorithm,
                lifetime_seconds,
            } => {
                let assertion = sign_assertion(
                    client_id,
                    key_id.as_deref(),
                    private_key,
                    audience,
                    scope.as_deref(),
                    *algorithm,
                    *lifetime_seconds,
                )?;
                let form = [
                    ("grant_type", "client_credentials".to_string()),
                    ("client_assertion_type", CLIENT_ASSERTION_TYPE.to_string()),
                    ("client_assertion", assertion),
                ];
                self.post_token_form(token_url, &form)
                    .await
                    .map_err(|e| Error::JwtGeneration {
                        message: format!("token exchange failed: {e}"),
                    })
            }

            _ => Err(Error::auth(
                "Token refresh not supported for this auth type",
            )),
        }
    }

    /// POST a form to a token endpoint and read a standard token response
    async fn post_token_form(&self, token_url: &str, form: &[(&str, String)]) -> Result<CachedToken> {
        let response = self.http_client.post(token_url).form(form).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::http_status(status, body));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into_cached_token())
    }

    /// Log in and capture either a body token or the session cookies
    async fn login(
        &self,
        login_url: &str,
        login_body: &Value,
        credential: &SessionCredential,
        otp: Option<&OtpStep>,
        lifetime_seconds: Option<i64>,
    ) -> Result<CachedToken> {
        let response = self
            .http_client
            .post(login_url)
            .json(login_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "Login request failed with status {status}: {body}"
            )));
        }

        let token = match credential {
            SessionCredential::Cookie => {
                let cookies: Vec<String> = response
                    .headers()
                    .get_all(reqwest::header::SET_COOKIE)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .filter_map(|v| v.split(';').next())
                    .map(|pair| pair.trim().to_string())
                    .filter(|pair| !pair.is_empty())
                    .collect();
                if cookies.is_empty() {
                    return Err(Error::auth("Login response set no session cookie"));
                }
                cookies.join("; ")
            }
            SessionCredential::Token { path, .. } => {
                let mut body: Value = response.json().await?;
                if let Some(step) = otp.filter(|step| step.is_required(&body)) {
                    body = self.validate_otp(step, &body).await?;
                }
                extract_token(&body, path).ok_or_else(|| {
                    Error::auth(format!("Could not extract token from path: {path}"))
                })?
            }
        };

        Ok(match lifetime_seconds {
            Some(secs) => CachedToken::expires_in(token, secs),
            None => CachedToken::new(token, None),
        })
    }

    /// Post the TOTP code for the user the login response names
    async fn validate_otp(&self, step: &OtpStep, login_response: &Value) -> Result<Value> {
        let secret = step.secret.as_deref().ok_or_else(|| {
            Error::auth("Login requires OTP validation but no OTP secret is configured")
        })?;
        let uid = lookup_dotted(login_response, &step.uid_path)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| {
                Error::auth(format!("Login response has no user id at {}", step.uid_path))
            })?;

        debug!(url = %step.url, "Validating login with one-time password");
        let response = self
            .http_client
            .post(&step.url)
            .json(&json!({"uid": uid, "otp": totp_code(secret)?}))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::auth(format!(
                "OTP validation failed with status {status}: {body}"
            )));
        }
        Ok(response.json().await?)
    }

    /// Drop the cached token so the next request authenticates again
    pub async fn invalidate(&self) {
        let mut cached = self.cached_token.write().await;
        *cached = None;
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}

/// Sign a client assertion JWT
fn sign_assertion(
    client_id: &str,
    key_id: Option<&str>,
    private_key: &str,
    audience: &str,
    scope: Option<&str>,
    algorithm: crate::types::JwtAlgorithm,
    lifetime_seconds: i64,
) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: client_id.to_string(),
        aud: audience.to_string(),
        scope: scope.map(String::from),
        iat: now,
        exp: now + lifetime_seconds,
    };

    let mut header = Header::new(algorithm.into());
    header.kid = key_id.map(String::from);

    let pem = decode_private_key(private_key)?;
    let encoding_key = match algorithm {
        crate::types::JwtAlgorithm::HS256
        | crate::types::JwtAlgorithm::HS384
        | crate::types::JwtAlgorithm::HS512 => EncodingKey::from_secret(pem.as_bytes()),
        crate::types::JwtAlgorithm::ES256 | crate::types::JwtAlgorithm::ES384 => {
            EncodingKey::from_ec_pem(pem.as_bytes()).map_err(|e| Error::JwtGeneration {
                message: format!("Invalid private key: {e}"),
            })?
        }
        _ => EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| Error::JwtGeneration {
            message: format!("Invalid private key: {e}"),
        })?,
    };

    encode(&header, &claims, &encoding_key).map_err(|e| Error::JwtGeneration {
        message: format!("Failed to encode JWT: {e}"),
    })
}

/// Current six-digit TOTP code (SHA-1, 30 second step) for a base32 secret.
///
/// Spaces, padding and lowercase letters in the secret are tolerated.
pub fn totp_code(secret: &str) -> Result<String> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let bytes = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|e| Error::auth(format!("Invalid OTP secret: {e:?}")))?;
    TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes)
        .generate_current()
        .map_err(|e| Error::auth(format!("System clock is before the epoch: {e}")))
}

/// Sign a request with AWS SigV4 and add the resulting headers.
///
/// Runs after every other header and the query are set, so the signature
/// covers the request exactly as sent.
fn sign_sigv4(
    req: RequestBuilder,
    credentials: Credentials,
    region: &str,
    service: &str,
) -> Result<RequestBuilder> {
    let (client, request) = req.build_split();
    let mut request = request?;

    let signing_headers: Vec<(String, String)> = {
        let identity = credentials.into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(region)
            .name(service)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()
            .map_err(|e| Error::auth(format!("Invalid SigV4 parameters: {e}")))?
            .into();

        let headers = request
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)));
        let body = request.body().and_then(|b| b.as_bytes()).unwrap_or_default();
        let signable = SignableRequest::new(
            request.method().as_str(),
            request.url().as_str(),
            headers,
            SignableBody::Bytes(body),
        )
        .map_err(|e| Error::auth(format!("Request cannot be signed: {e}")))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| Error::auth(format!("SigV4 signing failed: {e}")))?
            .into_parts();
        instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    };

    for (name, value) in signing_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::auth(format!("Invalid signing header {name}: {e}")))?;
        let value = HeaderValue::from_str(&value)
            .map_err(|e| Error::auth(format!("Invalid signing header value: {e}")))?;
        request.headers_mut().insert(name, value);
    }
    Ok(RequestBuilder::from_parts(client, request))
}

/// Accept a PEM key as-is, or unwrap one that was base64-encoded for
/// transport in a single-line config value.
pub fn decode_private_key(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("-----BEGIN") {
        return Ok(trimmed.to_string());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|e| Error::JwtGeneration {
            message: format!("Private key is neither PEM nor base64: {e}"),
        })?;
    String::from_utf8(bytes).map_err(|e| Error::JwtGeneration {
        message: format!("Decoded private key is not UTF-8: {e}"),
    })
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<Value>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        // Some providers send expires_in as a string
        let secs = self.expires_in.and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });
        match secs {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims {
    iss: String,
    aud: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    iat: i64,
    exp: i64,
}

/// Read a scalar token from a response body by dot path (`$.` prefix allowed)
pub fn extract_token(value: &Value, path: &str) -> Option<String> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    match lookup_dotted(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
