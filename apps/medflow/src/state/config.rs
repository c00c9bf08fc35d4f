//! # Configuration State
//!
//! Display snapshot of the loaded [`MedflowConfig`].
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`MEDFLOW_*`)
//! 2. Config file (`medflow.toml`)
//! 3. Defaults
//!
//! The assistant API key is never copied here, only whether one is set.

use std::path::{Path, PathBuf};

use serde::Serialize;

use medflow_sync::{MedflowConfig, RecordPushMode};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    /// Store name from `[store]`; a session may override it.
    pub store_name: String,

    pub currency_symbol: String,

    pub database_path: PathBuf,

    pub debounce_secs: u64,

    pub page_size: u32,

    pub record_push_mode: RecordPushMode,

    /// Unset means requests wait indefinitely.
    pub request_timeout_secs: Option<u64>,

    pub assistant_model: String,

    pub assistant_configured: bool,
}

impl ConfigState {
    pub fn new(config: &MedflowConfig, database_path: &Path) -> Self {
        ConfigState {
            store_name: config.store.name.clone(),
            currency_symbol: config.store.currency_symbol.clone(),
            database_path: database_path.to_path_buf(),
            debounce_secs: config.sync.debounce_secs,
            page_size: config.sync.page_size,
            record_push_mode: config.sync.record_push_mode,
            request_timeout_secs: config.sync.request_timeout_secs,
            assistant_model: config.assistant.model.clone(),
            assistant_configured: config
                .assistant
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_not_exposed() {
        let mut config = MedflowConfig::default();
        config.assistant.api_key = Some("secret-key".into());

        let state = ConfigState::new(&config, Path::new("/tmp/medflow.db"));
        let json = serde_json::to_string(&state).unwrap();

        assert!(state.assistant_configured);
        assert!(!json.contains("secret-key"));
        assert_eq!(state.debounce_secs, 15);
    }
}
