//! # State Module
//!
//! State types owned by [`AppController`](crate::controller::AppController).
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │   DomainState    │  │   ConfigState    │  │   SyncStatusDto      │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  items           │  │  store name      │  │  status              │  │
//! │  │  transactions    │  │  database path   │  │  last synced         │  │
//! │  │  session         │  │  sync settings   │  │  latency             │  │
//! │  │  store_name      │  │  (api key hidden)│  │  provider            │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DomainState: behind one tokio Mutex, never held across the network  │
//! │  • ConfigState: read-only snapshot for display                         │
//! │  • SyncStatusDto: built on demand from the orchestrator's state        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod domain;
mod sync;

pub use config::ConfigState;
pub use domain::{DomainState, PRODUCTS_COLLECTION, SALES_COLLECTION};
pub use sync::{LogEmitter, SyncStatusDto};
