//! # MedFlow Application
//!
//! Application layer of the MedFlow pharmacy point of sale: the controller
//! that owns Domain State, plus the startup plumbing the binary uses.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Initialize Logging ───────────────────────────────────────────────► │
//! │     • tracing-subscriber with env filter, written to stderr             │
//! │     • Default: info,medflow=debug,sqlx=warn (override with RUST_LOG)    │
//! │                                                                         │
//! │  2. Load Configuration ───────────────────────────────────────────────► │
//! │     • defaults → medflow.toml → MEDFLOW_* env → validate                │
//! │                                                                         │
//! │  3. Determine Database Path ──────────────────────────────────────────► │
//! │     • macOS: ~/Library/Application Support/com.medflow.pos/medflow.db   │
//! │     • Windows: %APPDATA%/medflow/pos/data/medflow.db                    │
//! │     • Linux: ~/.local/share/pos/medflow.db                              │
//! │                                                                         │
//! │  4. Open Local Store ─────────────────────────────────────────────────► │
//! │     • SQLite with WAL mode, pending migrations applied                  │
//! │                                                                         │
//! │  5. AppController::open ──────────────────────────────────────────────► │
//! │     • Domain State loaded (defaults where keys are missing)             │
//! │     • Debounce scheduler started                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod error;
pub mod state;

use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_subscriber::EnvFilter;

pub use controller::AppController;
pub use error::{ApiError, ApiResult, ErrorCode};

/// File name of the local store inside the data directory.
pub const DATABASE_FILE_NAME: &str = "medflow.db";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=medflow_sync=trace` - Trace the sync crate only
/// - Default: `info,medflow=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,medflow=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path based on the platform.
///
/// ## Development Override
/// Set `MEDFLOW_DB_PATH` to use a custom path.
pub fn database_path() -> Result<PathBuf, ApiError> {
    if let Ok(path) = std::env::var("MEDFLOW_DB_PATH") {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs = ProjectDirs::from("com", "medflow", "pos")
        .ok_or_else(|| ApiError::internal("Could not determine app data directory"))?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)?;

    Ok(data_dir.join(DATABASE_FILE_NAME))
}
