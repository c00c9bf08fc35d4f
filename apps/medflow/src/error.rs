//! # API Error Type
//!
//! Unified error type for controller operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in MedFlow                                │
//! │                                                                         │
//! │  CLI                          AppController                             │
//! │  ───                          ─────────────                             │
//! │                                                                         │
//! │  medflow sell --item 1:3                                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Operation                                                       │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Store Error? ─── StoreError::QueryFailed("...") ───┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Domain Error? ─── CoreError::InsufficientStock ── ApiError ───►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  error[INSUFFICIENT_STOCK]: Insufficient stock for Paracetamol 500mg:  │
//! │  available 2, requested 3                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Remote sync failures never show up here: they end as a sync status.

use serde::Serialize;

use medflow_core::{CoreError, ValidationError};
use medflow_store::StoreError;
use medflow_sync::SyncError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned from controller operations.
///
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Item not found: P-1729"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    /// Local store read/write failed
    StorageError,
    CartError,
    InsufficientStock,
    /// Backup file unreadable or incomplete
    InvalidBackup,
    ConfigError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::InvalidBackup => "INVALID_BACKUP",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::StorageError, "Local store connection failed")
            }
            StoreError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::StorageError, "Local store migration failed")
            }
            StoreError::PoolExhausted => {
                ApiError::new(ErrorCode::StorageError, "Local store is busy")
            }
            other => {
                tracing::error!("Local store operation failed: {}", other);
                ApiError::new(ErrorCode::StorageError, "Could not save to the local store")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ItemNotFound(id) => ApiError::not_found("Item", &id),
            CoreError::DuplicateItem(id) => {
                ApiError::validation(format!("Item '{}' already exists", id))
            }
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            e @ (CoreError::NotInCart(_) | CoreError::EmptyCart | CoreError::CartTooLarge { .. }) => {
                ApiError::new(ErrorCode::CartError, e.to_string())
            }
            e @ CoreError::QuantityTooLarge { .. } => ApiError::validation(e.to_string()),
            e @ CoreError::InvalidBackup(_) => ApiError::new(ErrorCode::InvalidBackup, e.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        if err.is_config_error() {
            ApiError::new(ErrorCode::ConfigError, err.to_string())
        } else {
            ApiError::internal(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(format!("JSON encoding failed: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(format!("File operation failed: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[{}]: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}
