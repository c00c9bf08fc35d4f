//! # medflow-store: Local Persistence Store
//!
//! The durable, local-first copy of everything MedFlow knows: the catalog,
//! the transaction ledger, the session record and the last sync time.
//!
//! ## Module Structure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          medflow-store                                  │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   pool.rs       │  │  migrations.rs  │  │   error.rs              │ │
//! │  │   ───────────   │  │  ─────────────  │  │   ─────────             │ │
//! │  │   LocalStore    │  │  Embedded SQL   │  │   StoreError            │ │
//! │  │   StoreConfig   │  │  local_store    │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     repository/                                  │   │
//! │  │   kv.rs     put / get of JSON under "medflow_<key>"              │   │
//! │  │   state.rs  items / transactions / session / last sync          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! Reads never fail: anything missing or unreadable is `None`. Writes return
//! [`StoreError`] so the caller can log and carry on.
//!
//! ## Usage
//! ```rust,no_run
//! use medflow_store::{LocalStore, StoreConfig};
//!
//! # async fn example() -> Result<(), medflow_store::StoreError> {
//! let store = LocalStore::open(StoreConfig::new("./medflow.db")).await?;
//! let items = store.state().load_items().await.unwrap_or_default();
//! store.state().save_items(&items).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use pool::{LocalStore, StoreConfig};
pub use repository::{KeyValueRepository, StateRepository};
