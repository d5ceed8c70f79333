//! Tests for YAML loader module

use super::*;
use crate::auth::{AuthConfig, Location, SessionCredential};
use crate::extract::ResponseShape;
use crate::pagination::PaginationConfig;
use crate::slice::SliceConfig;
use crate::template::TemplateContext;
use crate::types::Method;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use test_case::test_case;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MINIMAL: &str = r#"
name: test-connector
base_url: https://api.example.com
streams:
  - name: users
    request:
      path: /users
"#;

fn with_auth(auth: &str) -> String {
    format!(
        "name: test\nbase_url: https://api.example.com\nauth:\n{auth}\nstreams:\n  - name: data\n    request:\n      path: /data\n"
    )
}

// ============================================================================
// Basic Loading Tests
// ============================================================================

#[test]
fn test_load_minimal_connector() {
    let def = load_connector_from_str(MINIMAL).unwrap();
    assert_eq!(def.name, "test-connector");
    assert_eq!(def.version, "0.1.0");
    assert_eq!(def.base_url, "https://api.example.com");
    assert_eq!(def.stream_names(), vec!["users"]);

    let users = &def.streams[0];
    assert_eq!(users.request.method, Method::GET);
    assert_eq!(users.response, ResponseShape::default());
    assert_eq!(users.pagination, PaginationConfig::None);
    assert!(users.slicing.is_none());
    assert!(users.incremental.is_none());
    assert!(matches!(def.auth, AuthDefinition::None));
    assert_eq!(def.http.max_retries, 3);
    assert_eq!(def.http.timeout_secs, 30);
}

#[test]
fn test_load_full_stream_definition() {
    let yaml = r#"
name: tracker
base_url: https://api.example.com
streams:
  - name: projects
    primary_key: [id]
    request:
      path: /projects
    response:
      type: list
      path: data
    pagination:
      type: has_more
  - name: issues
    request:
      method: POST
      path: "/projects/{{ slice.project_id }}/issues"
      params:
        state: open
      state_param:
        param: updated_since
        cursor_field: updated_at
      body:
        project: "{{ slice.project_id }}"
    response:
      type: list
      path: issues
    transforms:
      - type: stamp_slice
        slice_key: project_id
        field: project_id
    slicing:
      type: parent
      stream: projects
      fields:
        - field: id
          key: project_id
    suppress_http_errors: [404]
    incremental:
      cursor_field: updated_at
      format: iso8601
"#;

    let def = load_connector_from_str(yaml).unwrap();
    let issues = def.stream("issues").unwrap();
    assert_eq!(issues.request.method, Method::POST);
    assert_eq!(issues.parent(), Some("projects"));
    assert_eq!(issues.suppress_http_errors, vec![404]);
    assert_eq!(issues.transforms.len(), 1);
    assert_eq!(issues.request.params.get("state"), Some(&json!("open")));
    assert_eq!(
        issues.request.state_param.as_ref().map(|p| p.param.as_str()),
        Some("updated_since")
    );
    assert_eq!(
        issues.incremental.as_ref().map(|i| i.cursor_field.as_str()),
        Some("updated_at")
    );
    assert_eq!(def.stream("projects").unwrap().primary_key, Some(vec!["id".to_string()]));
}

#[test]
fn test_load_connector_from_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();

    let def = load_connector(file.path()).unwrap();
    assert_eq!(def.name, "test-connector");
}

#[test]
fn test_load_builtin_by_name() {
    let def = load_connector("robin").unwrap();
    assert_eq!(def.name, "robin");
    assert!(def.stream("organization_locations").is_some());
}

#[test]
fn test_unknown_connector_lists_builtins() {
    let err = load_connector("no-such-connector").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("not found"), "{message}");
    assert!(message.contains("robin"), "{message}");
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test_case(
    "name: ''\nbase_url: https://x\nstreams:\n  - name: a\n    request:\n      path: /a\n",
    "name cannot be empty"
    ; "empty connector name"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams: []\n",
    "at least one stream"
    ; "no streams"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: a\n    request:\n      path: /a\n  - name: a\n    request:\n      path: /b\n",
    "Duplicate stream name"
    ; "duplicate names"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: ''\n    request:\n      path: /a\n",
    "Stream name cannot be empty"
    ; "empty stream name"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: a\n    request:\n      method: FETCH\n      path: /a\n",
    "Failed to parse"
    ; "invalid method"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: child\n    request:\n      path: /c\n    slicing:\n      type: parent\n      stream: missing\n      fields:\n        - field: id\n          key: id\n",
    "does not exist"
    ; "unknown parent"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: child\n    request:\n      path: /c\n    slicing:\n      type: parent\n      stream: parent\n      fields:\n        - field: id\n          key: id\n  - name: parent\n    request:\n      path: /p\n",
    "must be declared before"
    ; "parent declared later"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: a\n    request:\n      path: /a\n    slicing:\n      type: parent\n      stream: a\n      fields:\n        - field: id\n          key: id\n",
    "sliced over itself"
    ; "self parent"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: a\n    request:\n      path: /a\n    suppress_http_errors: [200]\n",
    "only suppress error statuses"
    ; "suppressing a success status"
)]
#[test_case(
    "name: t\nbase_url: https://x\nstreams:\n  - name: a\n    request:\n      path: /a\n      slice_params:\n        id: id\n",
    "is not sliced"
    ; "slice param without slicing"
)]
fn test_invalid_definitions(yaml: &str, expected: &str) {
    let err = load_connector_from_str(yaml).unwrap_err();
    assert!(err.is_config(), "{err}");
    let message = err.to_string();
    assert!(message.contains(expected), "{message}");
}

// ============================================================================
// Config Validation Tests
// ============================================================================

const WITH_CONFIG: &str = r#"
name: t
base_url: "https://{{ config.subdomain }}.example.com"
config:
  - name: api_key
    required: true
    secret: true
  - name: subdomain
    required: true
  - name: page_size
    type: integer
    default: 100
streams:
  - name: a
    request:
      path: /a
"#;

#[test]
fn test_required_config_fields() {
    let def = load_connector_from_str(WITH_CONFIG).unwrap();
    assert_eq!(def.required_fields().collect::<Vec<_>>(), vec!["api_key", "subdomain"]);

    def.validate_config(&json!({"api_key": "k", "subdomain": "acme"}))
        .unwrap();
}

#[test_case(json!({"subdomain": "acme"}), "api_key" ; "missing")]
#[test_case(json!({"api_key": "  ", "subdomain": "acme"}), "api_key" ; "blank")]
#[test_case(json!({"api_key": "k", "subdomain": null}), "subdomain" ; "null")]
fn test_missing_required_config(config: serde_json::Value, field: &str) {
    let def = load_connector_from_str(WITH_CONFIG).unwrap();
    let err = def.validate_config(&config).unwrap_err();
    assert_eq!(err.to_string(), format!("Missing required config field: {field}"));
}

#[test]
fn test_config_field_types() {
    let def = load_connector_from_str(WITH_CONFIG).unwrap();
    let base = |page_size: serde_json::Value| {
        json!({"api_key": "k", "subdomain": "acme", "page_size": page_size})
    };

    def.validate_config(&base(json!(50))).unwrap();
    def.validate_config(&base(json!("50"))).unwrap();

    let err = def.validate_config(&base(json!("fifty"))).unwrap_err();
    assert!(err.is_config());
    assert_eq!(
        err.to_string(),
        "Invalid config value for 'page_size': expected integer, got \"fifty\""
    );
}

#[test]
fn test_config_defaults_fill_gaps_only() {
    let def = load_connector_from_str(WITH_CONFIG).unwrap();
    let merged = def.config_with_defaults(&json!({"api_key": "k"}));
    assert_eq!(merged, json!({"api_key": "k", "page_size": 100}));

    let merged = def.config_with_defaults(&json!({"page_size": 5}));
    assert_eq!(merged["page_size"], json!(5));
}

// ============================================================================
// Auth Resolution Tests
// ============================================================================

#[test]
fn test_resolve_api_key_auth() {
    let yaml = with_auth(
        "  type: api_key\n  name: Authorization\n  prefix: \"Access-Token \"\n  value: \"{{ config.api_key }}\"",
    );
    let def = load_connector_from_str(&yaml).unwrap();
    let ctx = TemplateContext::with_config(json!({"api_key": "secret"}));

    match def.auth.resolve(&ctx, "https://api.example.com").unwrap() {
        AuthConfig::ApiKey {
            location,
            name,
            prefix,
            value,
        } => {
            assert_eq!(location, Location::Header);
            assert_eq!(name, "Authorization");
            assert_eq!(prefix.as_deref(), Some("Access-Token "));
            assert_eq!(value, "secret");
        }
        other => panic!("Expected ApiKey auth, got {other:?}"),
    }
}

#[test]
fn test_resolve_missing_variable_fails() {
    let yaml = with_auth("  type: bearer\n  token: \"{{ config.token }}\"");
    let def = load_connector_from_str(&yaml).unwrap();
    let err = def
        .auth
        .resolve(&TemplateContext::with_config(json!({})), "https://x")
        .unwrap_err();
    assert!(err.to_string().contains("config.token"), "{err}");
}

#[test]
fn test_resolve_session_auth() {
    let yaml = with_auth(
        r#"  type: session
  login_url: /api/1.4/desktop/authentication
  login_body:
    username: "{{ config.username }}"
    password: "{{ config.password }}"
    auth_type: local_authentication
  base64_fields: [password]
  token_path: message_response.authentication.auth_data.auth_token"#,
    );
    let def = load_connector_from_str(&yaml).unwrap();
    let ctx = TemplateContext::with_config(json!({"username": "admin", "password": "hunter2"}));

    match def.auth.resolve(&ctx, "https://dc.example.com:8383/").unwrap() {
        AuthConfig::Session {
            login_url,
            login_body,
            credential,
            lifetime_seconds,
            otp,
        } => {
            assert_eq!(login_url, "https://dc.example.com:8383/api/1.4/desktop/authentication");
            assert_eq!(otp, None);
            assert_eq!(
                login_body,
                json!({
                    "username": "admin",
                    "password": "aHVudGVyMg==",
                    "auth_type": "local_authentication"
                })
            );
            assert_eq!(
                credential,
                SessionCredential::Token {
                    path: "message_response.authentication.auth_data.auth_token".to_string(),
                    header: "Authorization".to_string(),
                    prefix: None,
                }
            );
            assert_eq!(lifetime_seconds, None);
        }
        other => panic!("Expected Session auth, got {other:?}"),
    }
}

#[test]
fn test_resolve_client_credentials_keeps_absolute_token_url() {
    let yaml = with_auth(
        r#"  type: oauth2_client_credentials
  token_url: "{{ config.token_url }}"
  client_id: "{{ config.client_id }}"
  client_secret: "{{ config.client_secret }}""#,
    );
    let def = load_connector_from_str(&yaml).unwrap();
    let ctx = TemplateContext::with_config(json!({
        "token_url": "https://auth.example.com/oauth2/token",
        "client_id": "id",
        "client_secret": "shh"
    }));

    match def.auth.resolve(&ctx, "https://api.example.com").unwrap() {
        AuthConfig::Oauth2ClientCredentials {
            token_url,
            client_id,
            scopes,
            ..
        } => {
            assert_eq!(token_url, "https://auth.example.com/oauth2/token");
            assert_eq!(client_id, "id");
            assert!(scopes.is_empty());
        }
        other => panic!("Expected client credentials, got {other:?}"),
    }
}

#[test]
fn test_resolve_jwt_assertion_defaults() {
    let yaml = with_auth(
        r#"  type: jwt_assertion
  token_url: /oauth/token
  client_id: "{{ config.client_id }}"
  private_key: "{{ config.private_key }}"
  audience: https://api.example.com/oauth/token"#,
    );
    let def = load_connector_from_str(&yaml).unwrap();
    let ctx = TemplateContext::with_config(json!({"client_id": "c", "private_key": "pem"}));

    match def.auth.resolve(&ctx, "https://api.example.com").unwrap() {
        AuthConfig::JwtAssertion {
            token_url,
            key_id,
            lifetime_seconds,
            ..
        } => {
            assert_eq!(token_url, "https://api.example.com/oauth/token");
            assert_eq!(key_id, None);
            assert_eq!(lifetime_seconds, 3600);
        }
        other => panic!("Expected JWT assertion, got {other:?}"),
    }
}

const SESSION_WITH_OTP: &str = r#"  type: session
  login_url: /login
  login_body:
    username: "{{ config.username }}"
  token_path: data.token
  otp:
    url: /login/otp
    secret: "{{ config.otp_key }}"
    required_path: data.otp_required
    uid_path: data.uid"#;

#[test_case(json!({"username": "u", "otp_key": "JBSWY3DPEHPK3PXP"}), Some("JBSWY3DPEHPK3PXP") ; "configured secret")]
#[test_case(json!({"username": "u"}), None ; "unset secret")]
#[test_case(json!({"username": "u", "otp_key": "  "}), None ; "blank secret")]
fn test_resolve_session_otp(config: serde_json::Value, secret: Option<&str>) {
    let def = load_connector_from_str(&with_auth(SESSION_WITH_OTP)).unwrap();
    let ctx = TemplateContext::with_config(config);

    match def.auth.resolve(&ctx, "https://api.example.com").unwrap() {
        AuthConfig::Session { otp: Some(otp), .. } => {
            assert_eq!(otp.url, "https://api.example.com/login/otp");
            assert_eq!(otp.secret.as_deref(), secret);
            assert_eq!(otp.required_path, "data.otp_required");
            assert_eq!(otp.uid_path, "data.uid");
        }
        other => panic!("Expected session auth with OTP, got {other:?}"),
    }
}

#[test]
fn test_resolve_aws_sigv4() {
    let yaml = with_auth(
        r#"  type: aws_sigv4
  access_key_id: "{{ config.aws_access_key_id }}"
  secret_access_key: "{{ config.aws_secret_access_key }}"
  region: "{{ config.aws_region_name }}"
  service: quicksight"#,
    );
    let def = load_connector_from_str(&yaml).unwrap();
    let ctx = TemplateContext::with_config(json!({
        "aws_access_key_id": "AKID",
        "aws_secret_access_key": "secret",
        "aws_region_name": "eu-west-1"
    }));

    match def.auth.resolve(&ctx, "https://api.example.com").unwrap() {
        AuthConfig::AwsSigv4 {
            access_key_id,
            region,
            service,
            session_token,
            ..
        } => {
            assert_eq!(access_key_id, "AKID");
            assert_eq!(region, "eu-west-1");
            assert_eq!(service, "quicksight");
            assert_eq!(session_token, None);
        }
        other => panic!("Expected SigV4 auth, got {other:?}"),
    }
}

// ============================================================================
// Runtime Construction Tests
// ============================================================================

#[tokio::test]
async fn test_build_streams_shares_parent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locations"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 7}, {"id": 8}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    for id in [7, 8] {
        Mock::given(method("GET"))
            .and(path(format!("/locations/{id}/spaces")))
            .and(query_param("per_page", "50"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": [{"id": id * 10}], "paging": {"has_next_page": false, "page": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let yaml = format!(
        r#"
name: rooms
base_url: "{{{{ config.base }}}}"
http:
  max_retries: 0
streams:
  - name: locations
    request:
      path: /locations
    response:
      type: list
      path: data
  - name: spaces
    request:
      path: "/locations/{{{{ slice.location_id }}}}/spaces"
    response:
      type: list
      path: data
    pagination:
      type: has_more
      page_size_param: per_page
      page_size: 50
    slicing:
      type: parent
      stream: locations
      fields:
        - field: id
          key: location_id
"#
    );
    let def = load_connector_from_str(&yaml).unwrap();
    let config = json!({"base": server.uri()});
    let client = build_client(&def, &config).unwrap();
    let streams = build_streams(&def, &config, &client).unwrap();

    assert_eq!(streams.len(), 2);
    assert_eq!(streams[1].descriptor().parent.as_deref(), Some("locations"));
    // The source's parent handle and the child's slicer share one stream
    assert_eq!(Arc::strong_count(&streams[0]), 2);

    let mut read = streams[1].read(None, crate::stream::ReadOptions::default());
    let records = read.collect_all().await.unwrap();
    let ids: Vec<_> = records.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(70), json!(80)]);
}

#[test]
fn test_slicing_config_round_trips_into_definition() {
    let def = load_connector("zoho-recruit").unwrap();
    let fields = def.stream("module_fields").unwrap();
    match fields.slicing.as_ref().unwrap() {
        SliceConfig::Parent {
            stream, exclude, ..
        } => {
            assert_eq!(stream, "modules");
            assert!(exclude.as_ref().unwrap().values.iter().any(|v| v == "home"));
        }
        other => panic!("Expected parent slicing, got {other:?}"),
    }
}
