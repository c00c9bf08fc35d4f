//! # MedFlow Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MEDFLOW_STORE_NAME="City Pharmacy"                                 │
//! │     MEDFLOW_RECORD_PUSH_MODE=append_latest                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/medflow.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.medflow.pos/medflow.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     15 s debounce, 500 records per pull, replace-all pushes            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [store]
//! name = "City Pharmacy"
//! currency_symbol = "$"
//!
//! [sync]
//! debounce_secs = 15
//! page_size = 500
//! record_push_mode = "replace_all"   # replace_all | append_latest
//! # request_timeout_secs = 30        # unset = no timeout
//!
//! [assistant]
//! model = "gemini-3-pro-preview"
//! api_key = "..."
//! ```
//!
//! The provider choice and its URLs are not configuration: they belong to the
//! session record created on connect.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use medflow_core::DEFAULT_STORE_NAME;

use crate::error::{SyncError, SyncResult};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "medflow.toml";

// =============================================================================
// Record Push Mode
// =============================================================================

/// How the record server adapter writes a collection.
///
/// ```text
/// REPLACE_ALL (Default)                 APPEND_LATEST
/// ─────────────────────                 ─────────────
/// GET  existing records                 POST the last element only
/// DELETE each of them
/// POST every element, last → first      Remote keeps growing; earlier
///                                       elements are never re-sent
/// Remote mirrors the local collection
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPushMode {
    #[default]
    ReplaceAll,
    AppendLatest,
}

impl std::fmt::Display for RecordPushMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordPushMode::ReplaceAll => write!(f, "replace_all"),
            RecordPushMode::AppendLatest => write!(f, "append_latest"),
        }
    }
}

impl std::str::FromStr for RecordPushMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "replace_all" | "replace" | "overwrite" => Ok(RecordPushMode::ReplaceAll),
            "append_latest" | "append" | "legacy" => Ok(RecordPushMode::AppendLatest),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown record push mode: '{}'. Valid options: replace_all, append_latest",
                other
            ))),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Store name shown on receipts and backups until a session sets one.
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    DEFAULT_STORE_NAME.to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Quiet period after the last mutation before a sync cycle runs.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Records requested per pull from the record server.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub record_push_mode: RecordPushMode,

    /// Per-request timeout. Unset means requests may wait forever.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_debounce_secs() -> u64 {
    15
}

fn default_page_size() -> u32 {
    500
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            debounce_secs: default_debounce_secs(),
            page_size: default_page_size(),
            record_push_mode: RecordPushMode::default(),
            request_timeout_secs: None,
        }
    }
}

impl SyncSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

// =============================================================================
// Assistant Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    /// Base URL of the generative-content API.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Without a key every assistant call answers with its fallback text.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_insight_temperature")]
    pub insight_temperature: f32,

    #[serde(default = "default_assistant_temperature")]
    pub assistant_temperature: f32,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_insight_temperature() -> f32 {
    0.2
}

fn default_assistant_temperature() -> f32 {
    0.4
}

impl Default for AssistantSettings {
    fn default() -> Self {
        AssistantSettings {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            insight_temperature: default_insight_temperature(),
            assistant_temperature: default_assistant_temperature(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedflowConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub sync: SyncSettings,

    #[serde(default)]
    pub assistant: AssistantSettings,
}

impl MedflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (medflow.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.store.name.trim().is_empty() {
            return Err(SyncError::InvalidConfig("store.name must not be empty".into()));
        }

        if self.sync.page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "page_size must be greater than 0".into(),
            ));
        }

        if self.sync.request_timeout_secs == Some(0) {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0 when set".into(),
            ));
        }

        let endpoint = &self.assistant.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(SyncError::InvalidUrl(format!(
                "Assistant endpoint must start with http:// or https://, got: {}",
                endpoint
            )));
        }

        for (name, t) in [
            ("insight_temperature", self.assistant.insight_temperature),
            ("assistant_temperature", self.assistant.assistant_temperature),
        ] {
            if !(0.0..=2.0).contains(&t) {
                return Err(SyncError::InvalidConfig(format!(
                    "{} must be between 0.0 and 2.0, got {}",
                    name, t
                )));
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides read through `lookup` (the process environment in
    /// production).
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("MEDFLOW_STORE_NAME") {
            debug!(store_name = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        if let Some(secs) = lookup("MEDFLOW_DEBOUNCE_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.sync.debounce_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid MEDFLOW_DEBOUNCE_SECS"),
            }
        }

        if let Some(size) = lookup("MEDFLOW_PAGE_SIZE") {
            match size.parse::<u32>() {
                Ok(s) => self.sync.page_size = s,
                Err(_) => warn!(value = %size, "Ignoring invalid MEDFLOW_PAGE_SIZE"),
            }
        }

        if let Some(mode) = lookup("MEDFLOW_RECORD_PUSH_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding record push mode from environment");
                    self.sync.record_push_mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown record push mode in environment"),
            }
        }

        if let Some(secs) = lookup("MEDFLOW_REQUEST_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.sync.request_timeout_secs = Some(s),
                Err(_) => warn!(value = %secs, "Ignoring invalid MEDFLOW_REQUEST_TIMEOUT_SECS"),
            }
        }

        if let Some(key) = lookup("MEDFLOW_ASSISTANT_API_KEY").or_else(|| lookup("GEMINI_API_KEY"))
        {
            self.assistant.api_key = Some(key);
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "medflow", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_push_mode_parsing() {
        assert_eq!("replace_all".parse::<RecordPushMode>().unwrap(), RecordPushMode::ReplaceAll);
        assert_eq!("append-latest".parse::<RecordPushMode>().unwrap(), RecordPushMode::AppendLatest);
        assert_eq!("LEGACY".parse::<RecordPushMode>().unwrap(), RecordPushMode::AppendLatest);
        assert!("sometimes".parse::<RecordPushMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = MedflowConfig::default();
        assert_eq!(config.store.name, "My Medical Store");
        assert_eq!(config.sync.debounce(), Duration::from_secs(15));
        assert_eq!(config.sync.page_size, 500);
        assert_eq!(config.sync.record_push_mode, RecordPushMode::ReplaceAll);
        assert_eq!(config.sync.request_timeout(), None);
        assert_eq!(config.assistant.model, "gemini-3-pro-preview");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = MedflowConfig::default();
        config.sync.page_size = 0;
        assert!(config.validate().is_err());

        let mut config = MedflowConfig::default();
        config.sync.request_timeout_secs = Some(0);
        assert!(config.validate().is_err());

        let mut config = MedflowConfig::default();
        config.assistant.endpoint = "ftp://nope".into();
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = MedflowConfig::default();
        config.assistant.assistant_temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MEDFLOW_STORE_NAME", "Green Cross"),
            ("MEDFLOW_DEBOUNCE_SECS", "3"),
            ("MEDFLOW_PAGE_SIZE", "not-a-number"),
            ("MEDFLOW_RECORD_PUSH_MODE", "append_latest"),
            ("GEMINI_API_KEY", "k-123"),
        ]
        .into_iter()
        .collect();

        let mut config = MedflowConfig::default();
        config.apply_env_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.store.name, "Green Cross");
        assert_eq!(config.sync.debounce_secs, 3);
        assert_eq!(config.sync.page_size, 500);
        assert_eq!(config.sync.record_push_mode, RecordPushMode::AppendLatest);
        assert_eq!(config.assistant.api_key.as_deref(), Some("k-123"));
    }

    #[test]
    fn test_partial_file_and_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[sync]\nrecord_push_mode = \"append_latest\"\n").unwrap();

        let loaded: MedflowConfig =
            toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.sync.record_push_mode, RecordPushMode::AppendLatest);
        assert_eq!(loaded.sync.debounce_secs, 15);
        assert_eq!(loaded.store.name, "My Medical Store");

        loaded.save(Some(path.clone())).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[store]"));
        assert!(text.contains("[assistant]"));
    }
}
