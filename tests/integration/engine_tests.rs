//! Integration tests for the suggestion engine
//!
//! Editing scenarios end to end: clause detection, USE handling, table
//! reference resolution and recovery from failed fetches.

use crate::common::{MockBackend, backend, labels};
use serde_json::json;
use sqlhint::completer::SuggestionEngine;
use sqlhint::config::Settings;
use sqlhint::metadata::FetchState;
use sqlhint::sql::{Clause, CursorPosition, end_position};
use sqlhint::suggest::{SuggestionItem, SuggestionKind};
use std::sync::Arc;
use std::time::Duration;

type Engine = SuggestionEngine<Arc<MockBackend>>;

fn engine(backend: &Arc<MockBackend>) -> Engine {
    SuggestionEngine::new(backend.clone(), &Settings::default())
}

async fn refresh_at_end(engine: &Engine, text: &str) {
    engine.refresh(text, end_position(text)).await;
}

/// Poll `done` while background fetches run, failing after a second.
async fn wait_until(done: impl Fn() -> bool) {
    let waited = tokio::time::timeout(Duration::from_secs(1), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached");
}

fn has_kind(items: &[SuggestionItem], kind: SuggestionKind) -> bool {
    items.iter().any(|i| i.kind == kind)
}

#[tokio::test]
async fn test_from_offers_catalogs_and_qualified_tables() {
    let backend = backend();
    let engine = engine(&backend);

    refresh_at_end(&engine, "SELECT * FROM ").await;

    assert_eq!(engine.current_clause(), Clause::From);
    let suggestions = engine.get_suggestions();
    let labels = labels(&suggestions);
    assert!(labels.contains(&"main"));
    assert!(labels.contains(&"main.default.orders"));
    assert!(labels.contains(&"WHERE"));
    assert!(!has_kind(&suggestions, SuggestionKind::Function));
}

#[tokio::test]
async fn test_use_catalog_sets_current_catalog() {
    let backend = backend();
    let engine = engine(&backend);

    refresh_at_end(&engine, "USE CATALOG main\nSELECT ").await;
    assert_eq!(engine.current_clause(), Clause::Select);
    assert_eq!(engine.current_catalog().as_deref(), Some("main"));

    refresh_at_end(&engine, "USE CATALOG main\nSELECT * FROM ").await;
    assert!(labels(&engine.get_suggestions()).contains(&"main.default"));
}

#[tokio::test]
async fn test_use_catalog_loads_its_schemas() {
    let backend = backend();
    let engine = engine(&backend);

    refresh_at_end(&engine, "USE CATALOG samples;\nSELECT * FROM ").await;

    assert_eq!(engine.current_catalog().as_deref(), Some("samples"));
    assert_eq!(engine.cache().schema_fetch_state("samples"), FetchState::Loaded);
    assert!(labels(&engine.get_suggestions()).contains(&"samples.tpch"));
}

#[tokio::test]
async fn test_use_qualified_schema_switches_both() {
    let backend = backend();
    let engine = engine(&backend);

    refresh_at_end(&engine, "USE samples.tpch;\nSELECT * FROM ").await;

    assert_eq!(engine.current_catalog().as_deref(), Some("samples"));
    assert_eq!(engine.current_schema().as_deref(), Some("tpch"));
    assert!(labels(&engine.get_suggestions()).contains(&"samples.tpch.lineitem"));
}

#[tokio::test]
async fn test_failed_columns_keep_constant_suggestions() {
    let backend = backend();
    let engine = engine(&backend);
    let text = "SELECT  FROM main.default.orders";
    let cursor = CursorPosition::new(1, 8);

    backend.fail("columns");
    engine.refresh(text, cursor).await;

    let suggestions = engine.get_suggestions();
    assert_eq!(engine.current_clause(), Clause::Select);
    assert!(has_kind(&suggestions, SuggestionKind::Keyword));
    assert!(has_kind(&suggestions, SuggestionKind::Function));
    assert!(has_kind(&suggestions, SuggestionKind::TemplateVariable));
    assert!(!has_kind(&suggestions, SuggestionKind::Column));
    assert_eq!(
        engine.cache().column_fetch_state("main.default.orders"),
        FetchState::Failed
    );

    backend.recover("columns");
    engine.refresh(text, cursor).await;

    let suggestions = engine.get_suggestions();
    let columns: Vec<&str> = suggestions
        .iter()
        .filter(|i| i.kind == SuggestionKind::Column)
        .map(|i| i.label.as_str())
        .collect();
    assert_eq!(columns, ["order_id", "customer_id", "total", "created_at"]);
    assert_eq!(backend.calls("columns"), 2);
}

#[tokio::test]
async fn test_schema_table_reading_discards_catalog_reading() {
    let backend = backend();
    let engine = engine(&backend);

    refresh_at_end(&engine, "SELECT * FROM sales.customers").await;

    assert_eq!(engine.cache().active_table().as_deref(), Some("main.sales.customers"));
    // `sales` is not a catalog, so only the defaults-driven schema fetch ran
    assert_eq!(backend.calls("schemas"), 1);
    assert_eq!(backend.calls_with("schemas", &json!({ "catalog": "sales" })), 0);
}

#[tokio::test]
async fn test_catalog_schema_reading_discards_schema_table_reading() {
    let backend = backend();
    let engine = engine(&backend);

    refresh_at_end(&engine, "SELECT * FROM samples.tpch").await;

    assert_eq!(
        backend.calls_with("tables", &json!({ "catalog": "samples", "schema": "tpch" })),
        1
    );
    assert_eq!(
        backend.calls_with("tables", &json!({ "catalog": "main", "schema": "samples" })),
        0
    );
    assert_eq!(backend.calls("columns"), 0);
    assert!(labels(&engine.get_suggestions()).contains(&"samples.tpch.lineitem"));
}

#[tokio::test]
async fn test_select_list_uses_table_after_cursor() {
    let backend = backend();
    let engine = engine(&backend);
    let text = "SELECT \nFROM main.sales.customers\nWHERE region = 'emea'";

    engine.refresh(text, CursorPosition::new(1, 8)).await;

    assert_eq!(engine.current_clause(), Clause::Select);
    let suggestions = engine.get_suggestions();
    assert!(labels(&suggestions).contains(&"region"));
    let region = suggestions.iter().find(|i| i.label == "region").unwrap();
    assert_eq!(region.detail, "string");
}

#[tokio::test]
async fn test_columns_follow_the_active_table() {
    let backend = backend();
    let engine = engine(&backend);

    // the reference is only read while the cursor is in SELECT or FROM
    refresh_at_end(&engine, "SELECT * FROM orders WHERE ").await;
    assert_eq!(engine.cache().active_table(), None);

    refresh_at_end(&engine, "SELECT * FROM orders").await;
    refresh_at_end(&engine, "SELECT * FROM orders WHERE ").await;
    assert!(labels(&engine.get_suggestions()).contains(&"total"));

    refresh_at_end(&engine, "SELECT * FROM payments").await;
    refresh_at_end(&engine, "SELECT * FROM payments ORDER BY ").await;
    let suggestions = engine.get_suggestions();
    assert_eq!(engine.current_clause(), Clause::OrderBy);
    assert!(labels(&suggestions).contains(&"payment_id"));
    assert!(!labels(&suggestions).contains(&"total"));

    // switching back reuses the cached columns
    refresh_at_end(&engine, "SELECT * FROM orders").await;
    assert_eq!(engine.cache().active_table().as_deref(), Some("main.default.orders"));
    assert_eq!(backend.calls("columns"), 2);
}

#[tokio::test]
async fn test_suggestions_available_before_metadata() {
    let backend = backend();
    let engine = engine(&backend);
    backend.pause();

    let text = "SELECT ";
    let handle = engine.update_suggestions(text, end_position(text));

    assert_eq!(engine.current_clause(), Clause::Select);
    let suggestions = engine.get_suggestions();
    assert!(has_kind(&suggestions, SuggestionKind::Function));
    assert!(has_kind(&suggestions, SuggestionKind::TemplateVariable));

    backend.resume();
    handle.await.unwrap();
    assert_eq!(engine.current_catalog().as_deref(), Some("main"));
}

#[tokio::test]
async fn test_concurrent_updates_share_initialization() {
    let backend = backend();
    let engine = engine(&backend);
    let text = "SELECT  FROM main.default.orders";
    let cursor = CursorPosition::new(1, 8);

    let first = engine.update_suggestions(text, cursor);
    let second = engine.clone().update_suggestions(text, cursor);
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(backend.calls("defaults"), 1);
    assert_eq!(backend.calls("columns"), 1);
    assert!(labels(&engine.get_suggestions()).contains(&"order_id"));
}

#[tokio::test]
async fn test_refresh_retries_failed_catalog_list() {
    let backend = backend();
    backend.fail("catalogs");
    let engine = engine(&backend);

    refresh_at_end(&engine, "SELECT * FROM ").await;
    assert!(!labels(&engine.get_suggestions()).contains(&"main"));
    // once during initialization, once more on refresh
    assert_eq!(backend.calls("catalogs"), 2);

    backend.recover("catalogs");
    refresh_at_end(&engine, "SELECT * FROM ").await;
    assert!(labels(&engine.get_suggestions()).contains(&"main"));
    assert_eq!(backend.calls("catalogs"), 3);
}

#[tokio::test]
async fn test_default_context_survives_failed_catalog_list() {
    let backend = backend();
    backend.fail("catalogs");
    let engine = engine(&backend);

    refresh_at_end(&engine, "SELECT * FROM ").await;
    assert_eq!(engine.current_catalog(), None);

    backend.recover("catalogs");
    refresh_at_end(&engine, "SELECT * FROM orders").await;

    assert_eq!(engine.current_catalog().as_deref(), Some("main"));
    assert_eq!(engine.current_schema().as_deref(), Some("default"));
    assert_eq!(engine.cache().active_table().as_deref(), Some("main.default.orders"));

    refresh_at_end(&engine, "SELECT * FROM ").await;
    assert!(labels(&engine.get_suggestions()).contains(&"main.default.orders"));
}

#[tokio::test]
async fn test_stalled_table_list_does_not_block_other_fetches() {
    let backend = backend();
    backend.stall("tables", json!({ "catalog": "main", "schema": "default" }));
    let engine = engine(&backend);

    let text = "SELECT  FROM samples.tpch.lineitem";
    let stalled = engine.update_suggestions(text, CursorPosition::new(1, 8));
    wait_until(|| labels(&engine.get_suggestions()).contains(&"l_orderkey")).await;
    assert!(!stalled.is_finished());

    // the stalled request is in flight, so this refresh does not wait on it
    refresh_at_end(&engine, "SELECT * FROM ").await;
    let from = engine.get_suggestions();
    assert!(labels(&from).contains(&"main"));
    assert!(labels(&from).contains(&"samples"));
    assert!(labels(&from).contains(&"main.default"));
    assert!(!labels(&from).contains(&"main.default.orders"));
    assert_eq!(
        backend.calls_with("tables", &json!({ "catalog": "main", "schema": "default" })),
        1
    );

    backend.release("tables");
    stalled.await.unwrap();
    assert!(labels(&engine.get_suggestions()).contains(&"main.default.orders"));
}

#[tokio::test]
async fn test_complete_table_reference() {
    let backend = backend();
    let engine = engine(&backend);

    assert_eq!(
        labels(&engine.complete_table_reference("").await),
        ["main.", "samples.", "default.", "sales.", "orders", "payments"]
    );
    assert_eq!(labels(&engine.complete_table_reference("samples.").await), ["tpch."]);
    assert_eq!(
        labels(&engine.complete_table_reference("main.sales").await),
        ["customers"]
    );

    let before = backend.total_calls();
    assert!(engine.complete_table_reference("nowhere.").await.is_empty());
    assert!(engine.complete_table_reference("a.b.c").await.is_empty());
    assert_eq!(backend.total_calls(), before);
}

#[tokio::test]
async fn test_extra_functions_from_settings() {
    let backend = backend();
    let settings = Settings {
        extra_functions: vec!["percentile_approx".to_string()],
        ..Settings::default()
    };
    let engine = SuggestionEngine::new(backend.clone(), &settings);

    refresh_at_end(&engine, "SELECT * FROM orders WHERE ").await;
    let suggestions = engine.get_suggestions();
    let function = suggestions
        .iter()
        .find(|i| i.label == "percentile_approx()")
        .unwrap();
    assert_eq!(function.text_to_insert(), "percentile_approx(${0})");
}
