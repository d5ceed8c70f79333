//! Tests for the reducer and StateManager

use super::*;
use crate::types::CursorFormat;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;
use test_case::test_case;

// ============================================================================
// Reducer Tests
// ============================================================================

#[test]
fn test_checkpoint_is_monotonic() {
    let reducer = CursorReducer::new("seq", CursorFormat::Unix);
    let mut checkpoint = None;
    let mut history = Vec::new();

    for seq in [5, 3, 9, 1] {
        checkpoint = reducer.advance(checkpoint.as_ref(), &json!({"seq": seq}));
        history.push(checkpoint.clone().unwrap());
    }

    assert_eq!(history, vec![json!(5), json!(5), json!(9), json!(9)]);
}

#[test]
fn test_first_record_sets_checkpoint() {
    let reducer = CursorReducer::new("updated_at", CursorFormat::Iso8601);
    let next = reducer.advance(None, &json!({"updated_at": "2024-03-01 10:00:00"}));
    assert_eq!(next, Some(json!("2024-03-01 10:00:00")));
}

#[test]
fn test_iso_dates_compare_as_instants() {
    let reducer = CursorReducer::new("updated_at", CursorFormat::Iso8601);
    // Later instant, lexically smaller because of the offset
    let current = json!("2024-03-01T10:00:00+00:00");
    let record = json!({"updated_at": "2024-03-01T09:30:00-01:00"});
    assert_eq!(
        reducer.advance(Some(&current), &record),
        Some(json!("2024-03-01T09:30:00-01:00"))
    );
}

#[test_case(json!({"id": 1}) ; "missing cursor")]
#[test_case(json!({"updated_at": null}) ; "null cursor")]
#[test_case(json!({"updated_at": "not a date"}) ; "unparseable cursor")]
fn test_unusable_record_keeps_checkpoint(record: serde_json::Value) {
    let reducer = CursorReducer::new("updated_at", CursorFormat::Iso8601);
    let current = json!("2024-01-01T00:00:00Z");
    assert_eq!(reducer.advance(Some(&current), &record), Some(current));
}

#[test]
fn test_nested_cursor_field() {
    let reducer = CursorReducer::new("updated_at.datetime", CursorFormat::Iso8601);
    let record = json!({"updated_at": {"datetime": "2024-05-05 05:05:05", "formatted": "x"}});
    assert_eq!(
        reducer.advance(None, &record),
        Some(json!("2024-05-05 05:05:05"))
    );
}

#[test]
fn test_is_newer() {
    let reducer = CursorReducer::new("updated_at", CursorFormat::Iso8601);
    let checkpoint = json!("2024-01-02 00:00:00");

    assert!(reducer.is_newer(None, &json!({"updated_at": "2000-01-01"})));
    assert!(reducer.is_newer(
        Some(&checkpoint),
        &json!({"updated_at": "2024-01-02 00:00:01"})
    ));
    assert!(!reducer.is_newer(
        Some(&checkpoint),
        &json!({"updated_at": "2024-01-02 00:00:00"})
    ));
    assert!(!reducer.is_newer(Some(&checkpoint), &json!({"updated_at": "2023-12-31"})));
    assert!(reducer.is_newer(Some(&checkpoint), &json!({"id": 7})));
}

#[test]
fn test_numeric_cursor_under_default_format_advances() {
    let reducer = CursorReducer::new("modified", CursorFormat::Iso8601);
    let mut state = StreamState::new();

    assert!(reducer.update(&mut state, &json!({"modified": 1_700_000_000})));
    assert!(reducer.update(&mut state, &json!({"modified": 1_700_000_500})));
    assert!(!reducer.update(&mut state, &json!({"modified": 1_600_000_000})));
    assert_eq!(state.get("modified"), Some(&json!(1_700_000_500)));

    let checkpoint = state.get("modified").cloned();
    assert!(!reducer.is_newer(checkpoint.as_ref(), &json!({"modified": 1_700_000_100})));
    assert!(reducer.is_newer(checkpoint.as_ref(), &json!({"modified": 1_700_000_501})));
}

#[test]
fn test_update_reports_change() {
    let reducer = CursorReducer::new("seq", CursorFormat::Unix);
    let mut state = StreamState::new();

    assert!(reducer.update(&mut state, &json!({"seq": 2})));
    assert!(!reducer.update(&mut state, &json!({"seq": 1})));
    assert!(!reducer.update(&mut state, &json!({"seq": 2})));
    assert!(reducer.update(&mut state, &json!({"seq": "3"})));
    assert_eq!(state.get("seq"), Some(&json!("3")));
}

// ============================================================================
// StateManager Tests
// ============================================================================

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
    assert!(manager.path().is_none());
}

#[tokio::test]
async fn test_advance_cursor() {
    let manager = StateManager::in_memory();
    let reducer = CursorReducer::new("updated_at", CursorFormat::Iso8601);

    assert!(manager
        .advance_cursor("events", &reducer, &json!({"updated_at": "2024-01-01"}))
        .await
        .unwrap());
    assert!(!manager
        .advance_cursor("events", &reducer, &json!({"updated_at": "2023-01-01"}))
        .await
        .unwrap());

    assert_eq!(
        manager.get_cursor("events", "updated_at").await,
        Some(json!("2024-01-01"))
    );
}

#[tokio::test]
async fn test_from_json() {
    let manager = StateManager::from_json(r#"{"events": {"updated_at": "2024-02-02"}}"#).unwrap();
    assert_eq!(
        manager.stream_state("events").await,
        Some(StreamState::with_cursor("updated_at", "2024-02-02"))
    );
    assert!(manager.stream_state("users").await.is_none());
}

#[test]
fn test_from_json_invalid() {
    let err = StateManager::from_json("{not json").unwrap_err();
    assert!(err.to_string().contains("Failed to parse state JSON"));
}

#[tokio::test]
async fn test_file_round_trip_is_atomic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::from_file(&path).unwrap();
    manager
        .set_stream_state("events", StreamState::with_cursor("updated_at", 42))
        .await
        .unwrap();

    assert!(path.exists());
    assert!(!dir.path().join("state.tmp").exists());

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(reloaded.get_cursor("events", "updated_at").await, Some(json!(42)));
}

#[tokio::test]
async fn test_without_auto_save_defers_write() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::from_file(&path).unwrap().without_auto_save();
    manager
        .set_stream_state("events", StreamState::with_cursor("updated_at", 1))
        .await
        .unwrap();
    assert!(!path.exists());

    manager.save().await.unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(json, json!({"events": {"updated_at": 1}}));
}

#[tokio::test]
async fn test_empty_state_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "").unwrap();

    let manager = StateManager::from_file(&path).unwrap();
    assert!(manager.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_clear_stream() {
    let manager = StateManager::from_json(r#"{"a": {"x": 1}, "b": {"y": 2}}"#).unwrap();
    manager.clear_stream("a").await.unwrap();
    let json = manager.to_json().await.unwrap();
    assert_eq!(json, r#"{"b":{"y":2}}"#);
}
