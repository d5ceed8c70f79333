//! Authentication module
//!
//! Supports: API Key, Basic, Bearer, query params, OAuth2 (client credentials
//! and refresh token), session login with optional TOTP validation, JWT
//! client assertion, custom headers and AWS SigV4 request signing.
//!
//! The `Authenticator` is shared by every stream of a sync run. Token-based
//! auth types fetch lazily on first use and again after expiry or after the
//! HTTP client reports a 401.

mod authenticator;
mod types;

pub use authenticator::{decode_private_key, extract_token, totp_code, Authenticator};
pub use types::{AuthConfig, CachedToken, Location, OtpStep, SessionCredential};
