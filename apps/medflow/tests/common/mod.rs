//! Shared fixtures: an in-process document store and controllers over
//! in-memory local stores.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::Value;

use medflow_app::AppController;
use medflow_core::{DocumentStoreConfig, Item, ProviderParams};
use medflow_store::{LocalStore, StoreConfig};
use medflow_sync::MedflowConfig;

// =============================================================================
// Controllers
// =============================================================================

/// Config whose debounce timer never fires during a test.
pub fn quiet_config() -> MedflowConfig {
    let mut config = MedflowConfig::default();
    config.sync.debounce_secs = 3600;
    config
}

pub async fn memory_store() -> LocalStore {
    LocalStore::open(StoreConfig::in_memory()).await.unwrap()
}

/// Controller plus a handle on its store for checking what was persisted.
pub async fn controller() -> (AppController, LocalStore) {
    controller_with(quiet_config()).await
}

pub async fn controller_with(config: MedflowConfig) -> (AppController, LocalStore) {
    let store = memory_store().await;
    let ctl = AppController::open(config, store.clone()).await.unwrap();
    (ctl, store)
}

pub fn item(id: &str, name: &str, price_cents: i64, stock: i64) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        generic_name: "Paracetamol".to_string(),
        category: "Analgesics".to_string(),
        price_cents,
        stock,
        expiry_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        batch_number: "BT-1".to_string(),
        manufacturer: "HealthCorp".to_string(),
        description: String::new(),
    }
}

pub fn document_params(store: &FakeDocumentStore, token: &str) -> ProviderParams {
    ProviderParams {
        record_server_url: None,
        document_store: Some(DocumentStoreConfig {
            url: store.root(),
            access_token: token.to_string(),
        }),
    }
}

// =============================================================================
// Document store
// =============================================================================

#[derive(Default)]
pub struct DocumentStoreState {
    pub token: String,
    pub documents: HashMap<String, Value>,
    pub failing: HashSet<String>,
    pub requests: usize,
}

#[derive(Clone)]
pub struct FakeDocumentStore {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<DocumentStoreState>>,
}

type SharedDocs = Arc<Mutex<DocumentStoreState>>;

impl FakeDocumentStore {
    pub async fn start(token: &str) -> Self {
        let state = Arc::new(Mutex::new(DocumentStoreState {
            token: token.to_string(),
            ..Default::default()
        }));
        let app = Router::new()
            .route("/{file}", get(get_document).put(put_document))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        FakeDocumentStore { addr, state }
    }

    pub fn root(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn fail_collection(&self, key: &str) {
        self.state.lock().unwrap().failing.insert(key.to_string());
    }

    pub fn document(&self, key: &str) -> Option<Value> {
        self.state.lock().unwrap().documents.get(key).cloned()
    }

    pub fn put(&self, key: &str, value: Value) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert(key.to_string(), value);
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }
}

fn authorize(
    s: &mut DocumentStoreState,
    file: &str,
    params: &HashMap<String, String>,
) -> Result<String, StatusCode> {
    s.requests += 1;
    if params.get("auth") != Some(&s.token) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let key = file.strip_suffix(".json").ok_or(StatusCode::NOT_FOUND)?;
    if s.failing.contains(key) {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(key.to_string())
}

async fn get_document(
    State(state): State<SharedDocs>,
    Path(file): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    let key = authorize(&mut s, &file, &params)?;
    Ok(Json(s.documents.get(&key).cloned().unwrap_or(Value::Null)))
}

async fn put_document(
    State(state): State<SharedDocs>,
    Path(file): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    let key = authorize(&mut s, &file, &params)?;
    s.documents.insert(key, body.clone());
    Ok(Json(body))
}
