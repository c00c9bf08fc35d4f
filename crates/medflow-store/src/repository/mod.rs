//! # Repository Module
//!
//! Access to the local persistence store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Controller                                                             │
//! │       │  store.state().save_items(&items)                              │
//! │       ▼                                                                 │
//! │  StateRepository   (typed: items, transactions, session, last sync)     │
//! │       │  kv.put("products", &items)                                    │
//! │       ▼                                                                 │
//! │  KeyValueRepository (JSON text under "medflow_<key>")                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  local_store table                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`KeyValueRepository`] - Namespaced JSON values
//! - [`StateRepository`] - Typed application state

pub mod kv;
pub mod state;

pub use kv::KeyValueRepository;
pub use state::StateRepository;
