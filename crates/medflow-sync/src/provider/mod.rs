//! # Remote Providers
//!
//! The two remote stores a session can mirror to, behind one capability.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Provider Selection                               │
//! │                                                                         │
//! │  session.provider ─┬─ none            → no provider, nothing to do     │
//! │                    │                                                    │
//! │                    ├─ record_server   → RecordServerProvider            │
//! │                    │     POST/GET/DELETE {base}/api/collections/{key}/… │
//! │                    │                                                    │
//! │                    └─ document_store  → DocumentStoreProvider           │
//! │                          PUT/GET {root}{key}.json?auth={token}          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! `push` answers `false` and `pull` answers `None` for every failure:
//! transport errors, non-success statuses, undecodable bodies. The cause is
//! logged at `warn` and dropped. Nothing is retried.

pub mod document_store;
pub mod record_server;

use async_trait::async_trait;
use serde_json::Value;

use medflow_core::{ProviderKind, SessionRecord};

use crate::config::SyncSettings;
use crate::error::{SyncError, SyncResult};

pub use document_store::DocumentStoreProvider;
pub use record_server::{normalize_base_url, RecordServerProvider};

// =============================================================================
// Capability
// =============================================================================

/// Best-effort push/pull of whole collections.
#[async_trait]
pub trait RemoteProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Writes `payload` as the remote copy of `collection`.
    async fn push(&self, collection: &str, payload: &Value) -> bool;

    /// Reads the remote copy of `collection`, if there is one.
    async fn pull(&self, collection: &str) -> Option<Value>;
}

// =============================================================================
// Dispatcher
// =============================================================================

/// The provider selected for a session.
pub enum Provider {
    RecordServer(RecordServerProvider),
    DocumentStore(DocumentStoreProvider),
}

impl Provider {
    /// Selects and configures the provider a session names.
    ///
    /// Returns `Ok(None)` for sessions on [`ProviderKind::None`] and
    /// [`SyncError::MissingProviderParams`] when the session names a provider
    /// without the parameters it needs (blank strings count as missing).
    pub fn for_session(
        session: &SessionRecord,
        settings: &SyncSettings,
        client: reqwest::Client,
    ) -> SyncResult<Option<Provider>> {
        match session.provider {
            ProviderKind::None => Ok(None),

            ProviderKind::RecordServer => {
                let base = session
                    .record_server_url
                    .as_deref()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or(SyncError::MissingProviderParams(ProviderKind::RecordServer))?;

                Ok(Some(Provider::RecordServer(RecordServerProvider::new(
                    base,
                    settings.record_push_mode,
                    settings.page_size,
                    client,
                ))))
            }

            ProviderKind::DocumentStore => {
                let doc = session
                    .document_store
                    .as_ref()
                    .filter(|d| !d.url.trim().is_empty())
                    .ok_or(SyncError::MissingProviderParams(ProviderKind::DocumentStore))?;

                Ok(Some(Provider::DocumentStore(DocumentStoreProvider::new(
                    &doc.url,
                    &doc.access_token,
                    client,
                ))))
            }
        }
    }
}

#[async_trait]
impl RemoteProvider for Provider {
    fn kind(&self) -> ProviderKind {
        match self {
            Provider::RecordServer(p) => p.kind(),
            Provider::DocumentStore(p) => p.kind(),
        }
    }

    async fn push(&self, collection: &str, payload: &Value) -> bool {
        match self {
            Provider::RecordServer(p) => p.push(collection, payload).await,
            Provider::DocumentStore(p) => p.push(collection, payload).await,
        }
    }

    async fn pull(&self, collection: &str) -> Option<Value> {
        match self {
            Provider::RecordServer(p) => p.pull(collection).await,
            Provider::DocumentStore(p) => p.pull(collection).await,
        }
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// Builds the shared HTTP client, applying the optional request timeout.
pub fn http_client(settings: &SyncSettings) -> SyncResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = settings.request_timeout() {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

/// Rejects non-success responses, keeping the status for the log line.
pub(crate) fn check_status(response: reqwest::Response) -> SyncResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SyncError::HttpStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
