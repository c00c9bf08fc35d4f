//! # State Repository
//!
//! Typed accessors for the four persisted pieces of application state.
//!
//! | key              | value                          |
//! |------------------|--------------------------------|
//! | `products`       | `Vec<Item>` (catalog)          |
//! | `sales`          | `Vec<Transaction>` (ledger)    |
//! | `user`           | `SessionRecord` or `null`      |
//! | `last_sync_time` | RFC 3339 timestamp             |

use chrono::{DateTime, Utc};
use medflow_core::{Item, SessionRecord, Transaction};

use crate::error::StoreResult;
use crate::repository::kv::{Entry, KeyValueRepository};

pub const ITEMS_KEY: &str = "products";
pub const TRANSACTIONS_KEY: &str = "sales";
pub const SESSION_KEY: &str = "user";
pub const LAST_SYNC_KEY: &str = "last_sync_time";

#[derive(Debug, Clone)]
pub struct StateRepository {
    kv: KeyValueRepository,
}

impl StateRepository {
    pub fn new(kv: KeyValueRepository) -> Self {
        StateRepository { kv }
    }

    pub async fn load_items(&self) -> Option<Vec<Item>> {
        self.kv.get(ITEMS_KEY).await
    }

    pub async fn save_items(&self, items: &[Item]) -> StoreResult<()> {
        self.kv.put(ITEMS_KEY, items).await
    }

    pub async fn load_transactions(&self) -> Option<Vec<Transaction>> {
        self.kv.get(TRANSACTIONS_KEY).await
    }

    pub async fn save_transactions(&self, transactions: &[Transaction]) -> StoreResult<()> {
        self.kv.put(TRANSACTIONS_KEY, transactions).await
    }

    /// Writes catalog and ledger together in one transaction.
    ///
    /// Used whenever both change at once (a sale, an import, a pull), so a
    /// failed write never leaves decremented stock without its sale.
    pub async fn save_ledger(&self, items: &[Item], transactions: &[Transaction]) -> StoreResult<()> {
        let entries = [
            Entry::new(ITEMS_KEY, items)?,
            Entry::new(TRANSACTIONS_KEY, transactions)?,
        ];
        self.kv.put_all(&entries).await
    }

    pub async fn load_session(&self) -> Option<SessionRecord> {
        self.kv.get(SESSION_KEY).await
    }

    /// Writes the session, or `null` when disconnected.
    pub async fn save_session(&self, session: Option<&SessionRecord>) -> StoreResult<()> {
        self.kv.put(SESSION_KEY, &session).await
    }

    pub async fn load_last_sync(&self) -> Option<DateTime<Utc>> {
        self.kv.get(LAST_SYNC_KEY).await
    }

    pub async fn save_last_sync(&self, at: DateTime<Utc>) -> StoreResult<()> {
        self.kv.put(LAST_SYNC_KEY, &at).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LocalStore, StoreConfig};
    use medflow_core::catalog::starter_catalog;
    use medflow_core::{Cart, PaymentMethod, ProviderKind, ProviderParams};

    async fn state() -> StateRepository {
        LocalStore::open(StoreConfig::in_memory()).await.unwrap().state()
    }

    #[tokio::test]
    async fn test_fresh_store_is_empty() {
        let state = state().await;
        assert!(state.load_items().await.is_none());
        assert!(state.load_transactions().await.is_none());
        assert!(state.load_session().await.is_none());
        assert!(state.load_last_sync().await.is_none());
    }

    #[tokio::test]
    async fn test_catalog_and_ledger_round_trip() {
        let state = state().await;
        let mut items = starter_catalog();
        let mut cart = Cart::new();
        cart.add_item(&items[0], 3).unwrap();
        let txn = cart
            .checkout(&mut items, PaymentMethod::Upi, None, Utc::now())
            .unwrap();

        state.save_items(&items).await.unwrap();
        state.save_transactions(std::slice::from_ref(&txn)).await.unwrap();

        assert_eq!(state.load_items().await.unwrap(), items);
        assert_eq!(state.load_transactions().await.unwrap(), vec![txn]);
    }

    #[tokio::test]
    async fn test_failed_ledger_write_rolls_back_catalog() {
        let store = LocalStore::open(StoreConfig::in_memory()).await.unwrap();
        let state = store.state();
        let items = starter_catalog();
        state.save_items(&items).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER reject_sales BEFORE INSERT ON local_store \
             WHEN NEW.key = 'medflow_sales' \
             BEGIN SELECT RAISE(ABORT, 'sales rejected'); END",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let mut sold = items.clone();
        sold[0].stock = 0;
        assert!(state.save_ledger(&sold, &[]).await.is_err());

        assert_eq!(state.load_items().await.unwrap(), items);
        assert!(state.load_transactions().await.is_none());
    }

    #[tokio::test]
    async fn test_session_cleared_with_null() {
        let state = state().await;
        let session = SessionRecord::connect(
            "owner@store.com",
            ProviderKind::RecordServer,
            ProviderParams::default(),
            "City Pharmacy",
        );

        state.save_session(Some(&session)).await.unwrap();
        assert_eq!(state.load_session().await, Some(session));

        state.save_session(None).await.unwrap();
        assert_eq!(state.load_session().await, None);
    }

    #[tokio::test]
    async fn test_last_sync_time() {
        let state = state().await;
        let at = DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        state.save_last_sync(at).await.unwrap();
        assert_eq!(state.load_last_sync().await, Some(at));
    }
}
