//! # medflow-sync: Remote Sync for MedFlow
//!
//! Best-effort mirroring of the local state to a remote store, plus the
//! assistant client. Local state is always the source of truth; nothing in
//! this crate can fail an operation the user started.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Architecture                                │
//! │                                                                         │
//! │   mutation ──poke──► DebounceScheduler ──15 s quiet──┐                  │
//! │                                                      ▼                  │
//! │   "sync now" ───────────────────────────────► Orchestrator              │
//! │                                                      │                  │
//! │                                   Provider::for_session(session)        │
//! │                                                      │                  │
//! │                       ┌──────────────────────────────┼────────────┐     │
//! │                       ▼                              ▼            ▼     │
//! │              RecordServerProvider        DocumentStoreProvider   none   │
//! │              (collections REST)          (PUT/GET {key}.json)           │
//! │                                                                         │
//! │   SyncState { in_progress, last_synced, status, latency_ms }            │
//! │   status: online | offline | error  ──► SyncEventEmitter               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - `MedflowConfig` (TOML + environment)
//! - [`error`] - Sync error types
//! - [`provider`] - `RemoteProvider` trait and both adapters
//! - [`orchestrator`] - Sync cycles and the status indicator
//! - [`scheduler`] - Debounced trigger
//! - [`assistant`] - Generative-content client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medflow_sync::{MedflowConfig, Orchestrator};
//!
//! let config = MedflowConfig::load_or_default(None);
//! let orchestrator = Orchestrator::new(config.sync.clone())?;
//!
//! let outcome = orchestrator
//!     .synchronize(&[("products", products_json), ("sales", sales_json)], session.as_ref())
//!     .await;
//! println!("Sync: {}", outcome.status);
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod scheduler;

pub use assistant::{AssistantClient, ASSISTANT_FALLBACK, INSIGHTS_FALLBACK};
pub use config::{AssistantSettings, MedflowConfig, RecordPushMode, StoreSettings, SyncSettings};
pub use error::{SyncError, SyncResult};
pub use orchestrator::{
    NoOpEmitter, Orchestrator, SyncEventEmitter, SyncOutcome, SyncState, SyncStatus,
};
pub use provider::{
    http_client, DocumentStoreProvider, Provider, RecordServerProvider, RemoteProvider,
};
pub use scheduler::{DebounceHandle, DebounceScheduler, SyncCallback};
