//! Tests for the source module

use super::*;
use crate::error::Error;
use crate::loader::load_connector_from_str;
use crate::state::{State, StreamState};
use crate::types::{LogLevel, SyncMode};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONNECTOR: &str = r#"
name: shop
title: Shop
base_url: "{{ config.base }}"
config:
  - name: base
    required: true
  - name: token
    required: true
    secret: true
  - name: region
    default: eu
auth:
  type: bearer
  token: "{{ config.token }}"
http:
  max_retries: 0
check:
  stream: orders
streams:
  - name: orders
    primary_key: [id]
    request:
      path: /orders
    response:
      type: list
      path: orders
    incremental:
      cursor_field: ts
      format: unix
  - name: broken
    request:
      path: /broken
  - name: refunds
    request:
      path: "/orders/{{ slice.order_id }}/refunds"
    slicing:
      type: parent
      stream: orders
      fields:
        - field: id
          key: order_id
"#;

fn source() -> DeclarativeSource {
    DeclarativeSource::new(load_connector_from_str(CONNECTOR).unwrap())
}

fn config(server: &MockServer) -> Value {
    json!({"base": server.uri(), "token": "t0k"})
}

async fn mount_orders(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("Authorization", "Bearer t0k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [{"id": 1, "ts": 5}, {"id": 2, "ts": 9}]
        })))
        .mount(server)
        .await;
}

async fn collect(stream: MessageStream) -> Vec<Message> {
    stream.map(|msg| msg.unwrap()).collect().await
}

fn summarize(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .map(|msg| match msg {
            Message::Record { stream, data, .. } => format!("record {stream} {}", data["id"]),
            Message::State { stream, data } => format!("state {stream} {data}"),
            Message::Log { level, message } => format!("log {level:?} {message}"),
        })
        .collect()
}

// ============================================================================
// Spec / Discover
// ============================================================================

#[test]
fn test_spec_lists_config_fields() {
    let spec = source().spec();
    assert_eq!(spec.name, "shop");
    assert_eq!(spec.title, "Shop");
    let names: Vec<_> = spec.config.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["base", "token", "region"]);
    assert!(spec.config[1].secret);
}

#[test]
fn test_discover() {
    let catalog = source().discover();
    assert_eq!(catalog.streams.len(), 3);

    let orders = catalog.stream("orders").unwrap();
    assert_eq!(
        orders.supported_sync_modes,
        vec![SyncMode::FullRefresh, SyncMode::Incremental]
    );
    assert_eq!(orders.default_cursor_field, Some(vec!["ts".to_string()]));
    assert_eq!(
        orders.source_defined_primary_key,
        Some(vec![vec!["id".to_string()]])
    );
    assert_eq!(orders.json_schema, json!({"type": "object"}));

    let refunds = catalog.stream("refunds").unwrap();
    assert_eq!(refunds.supported_sync_modes, vec![SyncMode::FullRefresh]);
    assert_eq!(refunds.parent.as_deref(), Some("orders"));
}

// ============================================================================
// Check
// ============================================================================

#[tokio::test]
async fn test_check_succeeds_on_first_record() {
    let server = MockServer::start().await;
    mount_orders(&server).await;

    let result = source().check_connection(&config(&server)).await;
    assert_eq!(result, CheckResult::success());
}

#[tokio::test]
async fn test_check_reports_missing_config() {
    let result = source()
        .check_connection(&json!({"base": "http://localhost"}))
        .await;
    assert!(!result.success);
    assert_eq!(
        result.message.as_deref(),
        Some("Missing required config field: token")
    );
}

#[tokio::test]
async fn test_check_reports_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let result = source().check_connection(&config(&server)).await;
    assert!(!result.success);
    assert!(result.message.unwrap().contains("403"));
}

#[tokio::test]
async fn test_check_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping/eu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let yaml = CONNECTOR.replace(
        "check:\n  stream: orders",
        "check:\n  path: \"/ping/{{ config.region }}\"",
    );
    let source = DeclarativeSource::new(load_connector_from_str(&yaml).unwrap());
    assert!(source.check_connection(&config(&server)).await.success);
}

// ============================================================================
// Read
// ============================================================================

#[tokio::test]
async fn test_read_emits_records_then_state() {
    let server = MockServer::start().await;
    mount_orders(&server).await;

    let selection = vec!["orders".to_string()];
    let messages = collect(
        source()
            .read(&config(&server), Some(&selection), None)
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(
        summarize(&messages),
        vec![
            "record orders 1",
            "record orders 2",
            r#"state orders {"ts":9}"#,
        ]
    );
}

#[tokio::test]
async fn test_read_checkpoints_every_n_records() {
    let server = MockServer::start().await;
    mount_orders(&server).await;

    let source = source().with_settings(ReadSettings::default().with_checkpoint_every(1));
    let selection = vec!["orders".to_string()];
    let messages = collect(
        source
            .read(&config(&server), Some(&selection), None)
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(
        summarize(&messages),
        vec![
            "record orders 1",
            r#"state orders {"ts":5}"#,
            "record orders 2",
            r#"state orders {"ts":9}"#,
            r#"state orders {"ts":9}"#,
        ]
    );
}

#[tokio::test]
async fn test_read_resumes_from_state() {
    let server = MockServer::start().await;
    mount_orders(&server).await;

    let mut state = State::new();
    state.set_stream("orders", StreamState::with_cursor("ts", 5));

    let selection = vec!["orders".to_string()];
    let messages = collect(
        source()
            .read(&config(&server), Some(&selection), Some(&state))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(
        summarize(&messages),
        vec!["record orders 2", r#"state orders {"ts":9}"#]
    );
}

#[tokio::test]
async fn test_failed_stream_logs_and_continues() {
    let server = MockServer::start().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    for id in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/orders/{id}/refunds")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": id * 100}])))
            .mount(&server)
            .await;
    }

    let messages = collect(source().read(&config(&server), None, None).await.unwrap()).await;

    let records: Vec<_> = messages.iter().filter(|m| m.is_record()).collect();
    assert_eq!(records.len(), 4);
    let errors: Vec<_> = messages
        .iter()
        .filter(|m| matches!(m, Message::Log { level: LogLevel::Error, .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    match errors[0] {
        Message::Log { message, .. } => assert!(message.starts_with("Stream 'broken' failed")),
        _ => unreachable!(),
    }
    assert_eq!(
        summarize(&messages).last().map(String::as_str),
        Some("record refunds 200")
    );
}

#[tokio::test]
async fn test_fail_fast_stops_the_read() {
    let server = MockServer::start().await;
    mount_orders(&server).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = source().with_settings(ReadSettings::default().fail_fast());
    let results: Vec<_> = source
        .read(&config(&server), None, None)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 4);
    assert!(results[..3].iter().all(Result::is_ok));
    assert_eq!(results[3].as_ref().err().and_then(Error::status), Some(500));
}

#[tokio::test]
async fn test_read_rejects_unknown_stream() {
    let server = MockServer::start().await;
    let selection = vec!["nope".to_string()];
    let err = source()
        .read(&config(&server), Some(&selection), None)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::StreamNotFound { ref stream } if stream == "nope"));
}

#[test]
fn test_message_json_lines() {
    let msg = Message::state("orders", &StreamState::with_cursor("ts", 9));
    assert_eq!(
        serde_json::to_value(&msg).unwrap(),
        json!({"type": "STATE", "stream": "orders", "data": {"ts": 9}})
    );

    let log = Message::error("boom");
    assert_eq!(
        serde_json::to_value(&log).unwrap(),
        json!({"type": "LOG", "level": "ERROR", "message": "boom"})
    );
}
