//! # Sync Orchestrator
//!
//! Runs sync cycles: picks the provider a session names, pushes each
//! collection in order and reduces the result to one status.
//!
//! ## Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          synchronize()                                  │
//! │                                                                         │
//! │  in_progress = true                                                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  session? provider?                                                     │
//! │   ├─ none / no session ───────────────────────────► ONLINE (no network) │
//! │   ├─ params missing ──────────────────────────────► ERROR  (no network) │
//! │   └─ provider ready                                                     │
//! │        │  push(products)   ┐ sequential,                                │
//! │        │  push(sales)      ┘ every collection is attempted              │
//! │        ▼                                                                │
//! │   all true ──► ONLINE, last_synced = now                                │
//! │   any false ─► ERROR                                                    │
//! │                                                                         │
//! │  in_progress = false, latency recorded, emitter notified                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cycles hold no lock across network calls. Two cycles started close
//! together overlap, and whichever finishes last decides the status.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use medflow_core::{ProviderKind, SessionRecord};

use crate::config::SyncSettings;
use crate::error::SyncResult;
use crate::provider::{http_client, Provider, RemoteProvider};

// =============================================================================
// Sync Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Online,
    #[default]
    Offline,
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Online => write!(f, "online"),
            SyncStatus::Offline => write!(f, "offline"),
            SyncStatus::Error => write!(f, "error"),
        }
    }
}

/// Snapshot of the sync indicator.
///
/// Only `last_synced` outlives the process (the caller persists it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub in_progress: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub status: SyncStatus,
    /// Duration of the last finished cycle.
    pub latency_ms: Option<u64>,
}

/// Result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    /// Collections the provider accepted.
    pub pushed: usize,
    /// Set when the cycle succeeded.
    pub synced_at: Option<DateTime<Utc>>,
    pub latency: Duration,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Online
    }
}

// =============================================================================
// Event Emitter Trait
// =============================================================================

/// Receives sync indicator changes (a UI, a log, a test probe).
pub trait SyncEventEmitter: Send + Sync {
    fn emit_state(&self, state: &SyncState);

    fn emit_error(&self, message: &str);
}

/// No-op event emitter for testing.
pub struct NoOpEmitter;

impl SyncEventEmitter for NoOpEmitter {
    fn emit_state(&self, _state: &SyncState) {}
    fn emit_error(&self, _message: &str) {}
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Clone)]
pub struct Orchestrator {
    settings: SyncSettings,
    client: reqwest::Client,
    state: Arc<RwLock<SyncState>>,
    emitter: Arc<dyn SyncEventEmitter>,
}

impl Orchestrator {
    pub fn new(settings: SyncSettings) -> SyncResult<Self> {
        Self::with_emitter(settings, Arc::new(NoOpEmitter))
    }

    pub fn with_emitter(
        settings: SyncSettings,
        emitter: Arc<dyn SyncEventEmitter>,
    ) -> SyncResult<Self> {
        let client = http_client(&settings)?;
        Ok(Orchestrator {
            settings,
            client,
            state: Arc::new(RwLock::new(SyncState::default())),
            emitter,
        })
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub async fn state(&self) -> SyncState {
        self.state.read().await.clone()
    }

    /// Seeds the indicator at startup: persisted last-sync time and the
    /// status implied by the stored session.
    pub async fn restore(&self, status: SyncStatus, last_synced: Option<DateTime<Utc>>) {
        let mut s = self.state.write().await;
        s.status = status;
        s.last_synced = last_synced;
    }

    /// Forces the status, e.g. to `offline` after a disconnect.
    pub async fn set_status(&self, status: SyncStatus) {
        let snapshot = {
            let mut s = self.state.write().await;
            s.status = status;
            s.clone()
        };
        self.emitter.emit_state(&snapshot);
    }

    /// Pushes `collections` in order to the provider `session` names.
    pub async fn synchronize(
        &self,
        collections: &[(&str, Value)],
        session: Option<&SessionRecord>,
    ) -> SyncOutcome {
        let started = Instant::now();
        self.begin().await;

        let (status, pushed) = match session {
            None => {
                debug!("No session, nothing to sync");
                (SyncStatus::Online, 0)
            }
            Some(s) if s.provider == ProviderKind::None => {
                debug!("Local-only session, nothing to sync");
                (SyncStatus::Online, 0)
            }
            Some(s) => match Provider::for_session(s, &self.settings, self.client.clone()) {
                Ok(Some(provider)) => self.push_all(&provider, collections).await,
                Ok(None) => (SyncStatus::Online, 0),
                Err(e) => {
                    warn!(provider = %s.provider, error = %e, "Cannot sync");
                    self.emitter.emit_error(&e.to_string());
                    (SyncStatus::Error, 0)
                }
            },
        };

        self.finish(status, pushed, started).await
    }

    /// One pull per collection from the provider `session` names.
    ///
    /// Collections that could not be read come back as `None`, as do all of
    /// them when the session has no usable provider.
    pub async fn pull(&self, collections: &[&str], session: &SessionRecord) -> Vec<Option<Value>> {
        let provider = match Provider::for_session(session, &self.settings, self.client.clone()) {
            Ok(Some(p)) => p,
            Ok(None) => return vec![None; collections.len()],
            Err(e) => {
                warn!(provider = %session.provider, error = %e, "Cannot pull");
                return vec![None; collections.len()];
            }
        };

        let mut pulled = Vec::with_capacity(collections.len());
        for key in collections {
            let value = provider.pull(key).await;
            debug!(collection = %key, found = value.is_some(), "Pulled collection");
            pulled.push(value);
        }
        pulled
    }

    async fn push_all(
        &self,
        provider: &dyn RemoteProvider,
        collections: &[(&str, Value)],
    ) -> (SyncStatus, usize) {
        let mut pushed = 0;
        for (key, payload) in collections {
            if provider.push(key, payload).await {
                pushed += 1;
            }
        }

        if pushed == collections.len() {
            (SyncStatus::Online, pushed)
        } else {
            (SyncStatus::Error, pushed)
        }
    }

    async fn begin(&self) {
        let snapshot = {
            let mut s = self.state.write().await;
            s.in_progress = true;
            s.clone()
        };
        self.emitter.emit_state(&snapshot);
    }

    async fn finish(&self, status: SyncStatus, pushed: usize, started: Instant) -> SyncOutcome {
        let latency = started.elapsed();
        let synced_at = (status == SyncStatus::Online).then(Utc::now);

        let snapshot = {
            let mut s = self.state.write().await;
            s.in_progress = false;
            s.status = status;
            s.latency_ms = Some(latency.as_millis() as u64);
            if synced_at.is_some() {
                s.last_synced = synced_at;
            }
            s.clone()
        };
        self.emitter.emit_state(&snapshot);

        info!(%status, pushed, latency_ms = latency.as_millis() as u64, "Sync cycle finished");

        SyncOutcome {
            status,
            pushed,
            synced_at,
            latency,
        }
    }
}
