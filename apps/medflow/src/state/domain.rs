//! # Domain State
//!
//! The catalog, the ledger and the session, as one value.
//!
//! Every field mirrors a key in the local store. Reads that fail or find
//! nothing fall back to defaults: the starter catalog, an empty ledger and
//! no session.

use serde_json::Value;

use medflow_core::catalog::starter_catalog;
use medflow_core::{Item, SessionRecord, Transaction};
use medflow_store::StateRepository;

use crate::error::ApiResult;

/// Remote collection holding the catalog.
pub const PRODUCTS_COLLECTION: &str = "products";

/// Remote collection holding the ledger.
pub const SALES_COLLECTION: &str = "sales";

#[derive(Debug, Clone)]
pub struct DomainState {
    /// Newest first.
    pub items: Vec<Item>,

    /// Newest first.
    pub transactions: Vec<Transaction>,

    pub session: Option<SessionRecord>,

    /// Session store name, else the configured one.
    pub store_name: String,
}

impl DomainState {
    pub async fn load(repo: &StateRepository, configured_store_name: &str) -> Self {
        let items = repo.load_items().await.unwrap_or_else(starter_catalog);
        let transactions = repo.load_transactions().await.unwrap_or_default();
        let session = repo.load_session().await;

        let store_name = session
            .as_ref()
            .map(|s| s.store_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(configured_store_name)
            .to_string();

        DomainState {
            items,
            transactions,
            session,
            store_name,
        }
    }

    /// Payloads pushed on every sync cycle, catalog first.
    pub fn collections(&self) -> ApiResult<Vec<(&'static str, Value)>> {
        Ok(vec![
            (PRODUCTS_COLLECTION, serde_json::to_value(&self.items)?),
            (SALES_COLLECTION, serde_json::to_value(&self.transactions)?),
        ])
    }

    /// True when debounced syncs should run.
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(SessionRecord::is_connected)
    }

    pub fn find_item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medflow_core::{ProviderKind, ProviderParams};
    use medflow_store::{LocalStore, StoreConfig};

    #[tokio::test]
    async fn test_empty_store_loads_defaults() {
        let store = LocalStore::open(StoreConfig::in_memory()).await.unwrap();
        let state = DomainState::load(&store.state(), "Corner Chemist").await;

        assert_eq!(state.items, starter_catalog());
        assert!(state.transactions.is_empty());
        assert!(state.session.is_none());
        assert_eq!(state.store_name, "Corner Chemist");
        assert!(!state.is_connected());
    }

    #[tokio::test]
    async fn test_session_store_name_wins() {
        let store = LocalStore::open(StoreConfig::in_memory()).await.unwrap();
        let session = SessionRecord::connect(
            "owner@store.com",
            ProviderKind::None,
            ProviderParams::default(),
            "City Pharmacy",
        );
        store.state().save_session(Some(&session)).await.unwrap();

        let state = DomainState::load(&store.state(), "Corner Chemist").await;
        assert_eq!(state.store_name, "City Pharmacy");
        // demo session never reaches the network
        assert!(!state.is_connected());
    }

    #[tokio::test]
    async fn test_collections_order() {
        let store = LocalStore::open(StoreConfig::in_memory()).await.unwrap();
        let state = DomainState::load(&store.state(), "Corner Chemist").await;

        let collections = state.collections().unwrap();
        assert_eq!(collections[0].0, PRODUCTS_COLLECTION);
        assert_eq!(collections[1].0, SALES_COLLECTION);
        assert_eq!(collections[0].1[0]["name"], "Paracetamol 500mg");
        assert_eq!(collections[1].1, serde_json::json!([]));
    }
}
