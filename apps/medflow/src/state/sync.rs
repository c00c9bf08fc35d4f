//! # Sync State Module
//!
//! Display form of the sync indicator and the emitter that logs it.
//!
//! ## Event Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │  Orchestrator ──emit_state──► LogEmitter ──► tracing (info/debug)        │
//! │               ──emit_error──► LogEmitter ──► tracing (error)             │
//! │                                                                          │
//! │  AppController::sync_state() ──► SyncStatusDto ──► `medflow status`      │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, error, info};

use medflow_core::{ProviderKind, SessionRecord};
use medflow_sync::{SyncEventEmitter, SyncState, SyncStatus};

/// Sync indicator as shown to the operator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusDto {
    /// `online`, `offline` or `error`
    pub status: String,

    pub in_progress: bool,

    /// Last successful sync (RFC 3339)
    pub last_synced_at: Option<String>,

    /// Duration of the last cycle in milliseconds
    pub latency_ms: Option<u64>,

    /// Active provider, `none` in demo mode
    pub provider: String,

    /// Whether debounced syncs reach the network
    pub is_connected: bool,
}

impl Default for SyncStatusDto {
    fn default() -> Self {
        Self {
            status: SyncStatus::Offline.to_string(),
            in_progress: false,
            last_synced_at: None,
            latency_ms: None,
            provider: ProviderKind::None.to_string(),
            is_connected: false,
        }
    }
}

impl From<SyncState> for SyncStatusDto {
    fn from(state: SyncState) -> Self {
        Self {
            status: state.status.to_string(),
            in_progress: state.in_progress,
            last_synced_at: state.last_synced.map(|t| t.to_rfc3339()),
            latency_ms: state.latency_ms,
            ..Self::default()
        }
    }
}

impl SyncStatusDto {
    /// Fills in the provider fields from the current session.
    pub fn with_session(mut self, session: Option<&SessionRecord>) -> Self {
        if let Some(s) = session {
            self.provider = s.provider.to_string();
            self.is_connected = s.is_connected();
        }
        self
    }
}

/// Emitter that writes sync indicator changes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmitter;

impl SyncEventEmitter for LogEmitter {
    fn emit_state(&self, state: &SyncState) {
        if state.in_progress {
            debug!("Sync started");
        } else {
            info!(
                status = %state.status,
                latency_ms = ?state.latency_ms,
                "Sync status"
            );
        }
    }

    fn emit_error(&self, message: &str) {
        error!(message, "Sync error");
    }
}
