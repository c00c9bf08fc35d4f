//! In-process fake remote stores for the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde_json::{json, Value};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

// =============================================================================
// Record server
// =============================================================================

#[derive(Default)]
pub struct RecordServerState {
    /// Records per collection, in creation order.
    pub collections: HashMap<String, Vec<Value>>,
    /// Collections that answer every request with 500.
    pub failing: HashSet<String>,
    pub requests: usize,
    next_id: usize,
}

#[derive(Clone)]
pub struct FakeRecordServer {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<RecordServerState>>,
}

impl FakeRecordServer {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(RecordServerState::default()));
        let app = Router::new()
            .route(
                "/api/collections/{key}/records",
                get(list_records).post(create_record),
            )
            .route("/api/collections/{key}/records/{id}", delete(delete_record))
            .with_state(state.clone());

        FakeRecordServer {
            addr: serve(app).await,
            state,
        }
    }

    /// Base address without a scheme, the way a user might type it.
    pub fn base(&self) -> String {
        self.addr.to_string()
    }

    pub fn fail_collection(&self, key: &str) {
        self.state.lock().unwrap().failing.insert(key.to_string());
    }

    pub fn records(&self, key: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }
}

type Shared = Arc<Mutex<RecordServerState>>;

async fn list_records(
    State(state): State<Shared>,
    Path(key): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.requests += 1;
    if s.failing.contains(&key) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let per_page: usize = params
        .get("perPage")
        .and_then(|p| p.parse().ok())
        .unwrap_or(30);
    let mut records = s.collections.get(&key).cloned().unwrap_or_default();
    if params.get("sort").map(String::as_str) == Some("-created") {
        records.reverse();
    }
    records.truncate(per_page);

    Ok(Json(json!({ "page": 1, "perPage": per_page, "items": records })))
}

async fn create_record(
    State(state): State<Shared>,
    Path(key): Path<String>,
    Json(mut record): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    let mut s = state.lock().unwrap();
    s.requests += 1;
    if s.failing.contains(&key) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    s.next_id += 1;
    if record.get("id").is_none() {
        record["id"] = json!(format!("rec{}", s.next_id));
    }
    s.collections.entry(key).or_default().push(record.clone());
    Ok(Json(record))
}

async fn delete_record(
    State(state): State<Shared>,
    Path((key, id)): Path<(String, String)>,
) -> StatusCode {
    let mut s = state.lock().unwrap();
    s.requests += 1;
    if s.failing.contains(&key) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let records = s.collections.entry(key).or_default();
    let before = records.len();
    records.retain(|r| r.get("id").and_then(Value::as_str) != Some(id.as_str()));
    if records.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// =============================================================================
// Document store
// =============================================================================

#[derive(Default)]
pub struct DocumentStoreState {
    pub documents: HashMap<String, Value>,
    pub token: String,
    pub failing: HashSet<String>,
    pub requests: usize,
}

#[derive(Clone)]
pub struct FakeDocumentStore {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<DocumentStoreState>>,
}

impl FakeDocumentStore {
    pub async fn start(token: &str) -> Self {
        let state = Arc::new(Mutex::new(DocumentStoreState {
            token: token.to_string(),
            ..Default::default()
        }));
        let app = Router::new()
            .route("/{file}", get(get_document).put(put_document))
            .with_state(state.clone());

        FakeDocumentStore {
            addr: serve(app).await,
            state,
        }
    }

    /// Document root, deliberately without the trailing slash.
    pub fn root(&self) -> String {
        format!("http://{}", self.addr)
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

type SharedDocs = Arc<Mutex<DocumentStoreState>>;

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
