//! Sync cycles end to end against fake servers.

mod common;

use common::{FakeDocumentStore, FakeRecordServer};
use medflow_core::{DocumentStoreConfig, ProviderKind, ProviderParams, SessionRecord};
use medflow_sync::{Orchestrator, SyncSettings, SyncStatus};
use serde_json::{json, Value};

fn record_session(base: &str) -> SessionRecord {
    SessionRecord::connect(
        "owner@store.com",
        ProviderKind::RecordServer,
        ProviderParams {
            record_server_url: Some(base.to_string()),
            document_store: None,
        },
        "City Pharmacy",
    )
}

fn document_session(root: &str, token: &str) -> SessionRecord {
    SessionRecord::connect(
        "owner@store.com",
        ProviderKind::DocumentStore,
        ProviderParams {
            record_server_url: None,
            document_store: Some(DocumentStoreConfig {
                url: root.to_string(),
                access_token: token.to_string(),
            }),
        },
        "City Pharmacy",
    )
}

fn collections() -> Vec<(&'static str, Value)> {
    vec![
        ("products", json!([{"id": "1", "name": "Paracetamol 500mg"}])),
        ("sales", json!([{"id": "S-000001"}])),
    ]
}

#[tokio::test]
async fn test_local_only_session_makes_no_requests() {
    let server = FakeRecordServer::start().await;
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();

    // the URL points at a live server but the provider says local only
    let mut session = record_session(&server.base());
    session.provider = ProviderKind::None;

    let outcome = orch.synchronize(&collections(), Some(&session)).await;
    assert_eq!(outcome.status, SyncStatus::Online);
    assert_eq!(server.requests(), 0);
}

#[tokio::test]
async fn test_all_pushes_succeed_is_online() {
    let store = FakeDocumentStore::start("tok").await;
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();
    let session = document_session(&store.root(), "tok");

    let outcome = orch.synchronize(&collections(), Some(&session)).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.pushed, 2);
    assert!(outcome.synced_at.is_some());
    assert_eq!(store.document("products"), Some(collections()[0].1.clone()));
    assert_eq!(store.document("sales"), Some(collections()[1].1.clone()));

    let state = orch.state().await;
    assert_eq!(state.status, SyncStatus::Online);
    assert_eq!(state.last_synced, outcome.synced_at);
    assert!(state.latency_ms.is_some());
    assert!(!state.in_progress);
}

#[tokio::test]
async fn test_second_push_failing_is_error() {
    let store = FakeDocumentStore::start("tok").await;
    store.fail_collection("sales");
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();
    let session = document_session(&store.root(), "tok");

    let outcome = orch.synchronize(&collections(), Some(&session)).await;

    assert_eq!(outcome.status, SyncStatus::Error);
    assert_eq!(outcome.pushed, 1);
    assert_eq!(outcome.synced_at, None);
    // the first collection still reached the server
    assert!(store.document("products").is_some());
    assert_eq!(orch.state().await.last_synced, None);
}

#[tokio::test]
async fn test_first_push_failing_still_attempts_second() {
    let server = FakeRecordServer::start().await;
    server.fail_collection("products");
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();
    let session = record_session(&server.base());

    let outcome = orch.synchronize(&collections(), Some(&session)).await;

    assert_eq!(outcome.status, SyncStatus::Error);
    assert_eq!(server.records("sales").len(), 1);
}

#[tokio::test]
async fn test_error_then_recovery_updates_status() {
    let store = FakeDocumentStore::start("tok").await;
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();

    let wrong = document_session(&store.root(), "nope");
    assert_eq!(orch.synchronize(&collections(), Some(&wrong)).await.status, SyncStatus::Error);
    assert_eq!(orch.state().await.status, SyncStatus::Error);

    let right = document_session(&store.root(), "tok");
    assert_eq!(orch.synchronize(&collections(), Some(&right)).await.status, SyncStatus::Online);
    assert_eq!(orch.state().await.status, SyncStatus::Online);
}

#[tokio::test]
async fn test_missing_params_makes_no_requests() {
    let server = FakeRecordServer::start().await;
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();
    let session = SessionRecord::connect(
        "owner@store.com",
        ProviderKind::RecordServer,
        ProviderParams::default(),
        "City Pharmacy",
    );

    let outcome = orch.synchronize(&collections(), Some(&session)).await;
    assert_eq!(outcome.status, SyncStatus::Error);
    assert_eq!(server.requests(), 0);
}

#[tokio::test]
async fn test_pull_returns_one_value_per_collection() {
    let store = FakeDocumentStore::start("tok").await;
    store.put("products", json!([{"id": "9"}]));
    let orch = Orchestrator::new(SyncSettings::default()).unwrap();
    let session = document_session(&store.root(), "tok");

    let pulled = orch.pull(&["products", "sales"], &session).await;
    assert_eq!(pulled, vec![Some(json!([{"id": "9"}])), None]);
}
