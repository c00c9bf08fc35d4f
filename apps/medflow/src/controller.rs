//! # Application Controller
//!
//! Owns Domain State and is the only place it changes.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every Mutation                                       │
//! │                                                                         │
//! │  1. lock DomainState                                                    │
//! │  2. apply the change to a copy (core rules: validation, checkout)       │
//! │  3. persist the affected keys to the local store                        │
//! │  4. commit the copy ◄── a failed write leaves state unchanged           │
//! │  5. unlock                                                              │
//! │  6. poke the debounce scheduler                                         │
//! │                                                                         │
//! │  Debounce expiry (15s after the last poke):                             │
//! │     snapshot ──► session connected? ──no──► skip                        │
//! │                          │                                              │
//! │                         yes                                             │
//! │                          ▼                                              │
//! │     Orchestrator::synchronize(products, sales) ──► save last sync time  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The state lock is never held across a network call. Sync cycles are
//! not serialized against each other.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use chrono::{NaiveDate, Utc};
use futures_util::FutureExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use medflow_core::insights::{self, DashboardStats};
use medflow_core::validation::{
    validate_email, validate_item, validate_search_query, validate_store_name,
};
use medflow_core::{
    BackupDocument, Cart, Confirmation, CoreError, Item, PaymentMethod, ProviderKind,
    ProviderParams, SessionRecord, Transaction,
};
use medflow_store::{LocalStore, StateRepository};
use medflow_sync::{
    http_client, AssistantClient, DebounceHandle, DebounceScheduler, MedflowConfig, Orchestrator,
    SyncCallback, SyncOutcome, SyncStatus,
};

use crate::error::ApiResult;
use crate::state::{DomainState, LogEmitter, SyncStatusDto, PRODUCTS_COLLECTION, SALES_COLLECTION};

/// Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct AppController {
    inner: Arc<Inner>,
}

struct Inner {
    store: LocalStore,
    state: Mutex<DomainState>,
    orchestrator: Orchestrator,
    assistant: AssistantClient,
    config: MedflowConfig,
    debounce: DebounceHandle,
}

impl AppController {
    /// Loads Domain State from `store` and starts the debounce scheduler.
    ///
    /// Must be called inside a tokio runtime.
    pub async fn open(config: MedflowConfig, store: LocalStore) -> ApiResult<Self> {
        let domain = DomainState::load(&store.state(), &config.store.name).await;
        let last_sync = store.state().load_last_sync().await;

        let orchestrator = Orchestrator::with_emitter(config.sync.clone(), Arc::new(LogEmitter))?;
        let initial = match &domain.session {
            Some(s) if s.is_logged_in => SyncStatus::Online,
            _ => SyncStatus::Offline,
        };
        orchestrator.restore(initial, last_sync).await;

        let assistant = AssistantClient::new(config.assistant.clone(), http_client(&config.sync)?);

        info!(
            items = domain.items.len(),
            transactions = domain.transactions.len(),
            provider = %domain.session.as_ref().map(|s| s.provider).unwrap_or_default(),
            "Domain state loaded"
        );

        let delay = config.sync.debounce();
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let callback: SyncCallback = Arc::new(move || {
                let weak = weak.clone();
                async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.debounced_sync().await;
                    }
                }
                .boxed()
            });

            Inner {
                store,
                state: Mutex::new(domain),
                orchestrator,
                assistant,
                config,
                debounce: DebounceScheduler::spawn(delay, callback),
            }
        });

        Ok(AppController { inner })
    }

    pub fn config(&self) -> &MedflowConfig {
        &self.inner.config
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn items(&self) -> Vec<Item> {
        self.inner.state.lock().await.items.clone()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.inner.state.lock().await.transactions.clone()
    }

    pub async fn session(&self) -> Option<SessionRecord> {
        self.inner.state.lock().await.session.clone()
    }

    pub async fn store_name(&self) -> String {
        self.inner.state.lock().await.store_name.clone()
    }

    /// Items whose name, generic name or category contains `query`.
    pub async fn search_items(&self, query: &str) -> ApiResult<Vec<Item>> {
        let query = validate_search_query(query)?;
        let state = self.inner.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter(|i| i.matches(&query))
            .cloned()
            .collect())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Adds an item at the head of the catalog.
    ///
    /// A blank id is replaced with a generated one.
    pub async fn add_item(&self, mut item: Item) -> ApiResult<Item> {
        if item.id.trim().is_empty() {
            item.id = Item::generate_id();
        }
        validate_item(&item)?;

        let mut state = self.inner.state.lock().await;
        if state.find_item(&item.id).is_some() {
            return Err(CoreError::DuplicateItem(item.id).into());
        }

        let mut items = state.items.clone();
        items.insert(0, item.clone());
        self.inner.repo().save_items(&items).await?;
        state.items = items;
        drop(state);

        info!(id = %item.id, name = %item.name, "Item added");
        self.inner.touch();
        Ok(item)
    }

    /// Replaces the item with the same id.
    pub async fn update_item(&self, item: Item) -> ApiResult<Item> {
        validate_item(&item)?;

        let mut state = self.inner.state.lock().await;
        let idx = state
            .items
            .iter()
            .position(|i| i.id == item.id)
            .ok_or_else(|| CoreError::ItemNotFound(item.id.clone()))?;

        let mut items = state.items.clone();
        items[idx] = item.clone();
        self.inner.repo().save_items(&items).await?;
        state.items = items;
        drop(state);

        info!(id = %item.id, "Item updated");
        self.inner.touch();
        Ok(item)
    }

    /// Removes an item. Returns `false` when the operator declined.
    pub async fn delete_item(&self, id: &str, confirmation: Confirmation) -> ApiResult<bool> {
        if !confirmation.is_confirmed() {
            debug!(id, "Delete declined");
            return Ok(false);
        }

        let mut state = self.inner.state.lock().await;
        if state.find_item(id).is_none() {
            return Err(CoreError::ItemNotFound(id.to_string()).into());
        }

        let items: Vec<Item> = state.items.iter().filter(|i| i.id != id).cloned().collect();
        self.inner.repo().save_items(&items).await?;
        state.items = items;
        drop(state);

        info!(id, "Item deleted");
        self.inner.touch();
        Ok(true)
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Builds a cart from `(item id, quantity)` pairs against the current
    /// catalog.
    pub async fn build_cart(&self, lines: &[(String, i64)]) -> ApiResult<Cart> {
        let state = self.inner.state.lock().await;
        let mut cart = Cart::new();
        for (id, quantity) in lines {
            let item = state
                .find_item(id)
                .ok_or_else(|| CoreError::ItemNotFound(id.clone()))?;
            cart.add_item(item, *quantity)?;
        }
        Ok(cart)
    }

    /// Records the sale at the head of the ledger and decrements stock.
    pub async fn complete_sale(
        &self,
        cart: &Cart,
        payment_method: PaymentMethod,
        customer_name: Option<&str>,
    ) -> ApiResult<Transaction> {
        let mut state = self.inner.state.lock().await;

        let mut items = state.items.clone();
        let transaction = cart.checkout(&mut items, payment_method, customer_name, Utc::now())?;
        let mut transactions = state.transactions.clone();
        transactions.insert(0, transaction.clone());

        self.inner.repo().save_ledger(&items, &transactions).await?;
        state.items = items;
        state.transactions = transactions;
        drop(state);

        info!(
            id = %transaction.id,
            total = %transaction.total(),
            lines = transaction.items.len(),
            "Sale completed"
        );
        self.inner.touch();
        Ok(transaction)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Starts a session and pulls the remote collections.
    ///
    /// A pulled collection that decodes replaces the local one outright.
    pub async fn connect(
        &self,
        email: &str,
        provider: ProviderKind,
        params: ProviderParams,
    ) -> ApiResult<SessionRecord> {
        validate_email(email)?;

        let session = {
            let mut state = self.inner.state.lock().await;
            let session = SessionRecord::connect(email, provider, params, &state.store_name);
            self.inner.repo().save_session(Some(&session)).await?;
            state.session = Some(session.clone());
            session
        };

        info!(email = %session.email, provider = %session.provider, "Connected");
        let status = if session.is_logged_in {
            SyncStatus::Online
        } else {
            SyncStatus::Offline
        };
        self.inner.orchestrator.set_status(status).await;

        if session.is_connected() {
            self.apply_pulled(&session).await?;
        }

        self.inner.touch();
        Ok(session)
    }

    async fn apply_pulled(&self, session: &SessionRecord) -> ApiResult<()> {
        let pulled = self
            .inner
            .orchestrator
            .pull(&[PRODUCTS_COLLECTION, SALES_COLLECTION], session)
            .await;
        let mut pulled = pulled.into_iter();
        let items: Option<Vec<Item>> =
            decode::<Vec<Item>>(PRODUCTS_COLLECTION, pulled.next().flatten()).filter(|items| valid_catalog(items));
        let transactions: Option<Vec<Transaction>> =
            decode(SALES_COLLECTION, pulled.next().flatten());

        if items.is_none() && transactions.is_none() {
            return Ok(());
        }

        let mut state = self.inner.state.lock().await;
        let catalog_replaced = items.is_some();
        let ledger_replaced = transactions.is_some();
        let items = items.unwrap_or_else(|| state.items.clone());
        let transactions = transactions.unwrap_or_else(|| state.transactions.clone());

        self.inner.repo().save_ledger(&items, &transactions).await?;
        if catalog_replaced {
            info!(count = items.len(), "Catalog replaced from remote");
        }
        if ledger_replaced {
            info!(count = transactions.len(), "Ledger replaced from remote");
        }
        state.items = items;
        state.transactions = transactions;
        Ok(())
    }

    /// Ends the session. Catalog and ledger stay.
    pub async fn disconnect(&self) -> ApiResult<()> {
        {
            let mut state = self.inner.state.lock().await;
            self.inner.repo().save_session(None).await?;
            state.session = None;
        }

        self.inner.orchestrator.set_status(SyncStatus::Offline).await;
        info!("Disconnected");
        Ok(())
    }

    /// Changes the store name shown on receipts and backups.
    pub async fn set_store_name(&self, name: &str) -> ApiResult<()> {
        validate_store_name(name)?;
        self.inner.apply_store_name(name.trim()).await?;
        self.inner.touch();
        Ok(())
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Runs one sync cycle now, whatever the session.
    pub async fn sync_now(&self) -> ApiResult<SyncOutcome> {
        let (collections, session) = self.inner.snapshot().await?;
        Ok(self.inner.run_cycle(&collections, session.as_ref()).await)
    }

    pub async fn sync_state(&self) -> SyncStatusDto {
        let session = self.session().await;
        SyncStatusDto::from(self.inner.orchestrator.state().await).with_session(session.as_ref())
    }

    // =========================================================================
    // Backup
    // =========================================================================

    pub async fn export_backup(&self) -> BackupDocument {
        let state = self.inner.state.lock().await;
        BackupDocument::new(
            state.items.clone(),
            state.transactions.clone(),
            Some(state.store_name.clone()),
            Utc::now(),
        )
    }

    /// Writes `medflow_backup_YYYY-MM-DD.json` into `dir`.
    pub async fn export_backup_to(&self, dir: &Path) -> ApiResult<PathBuf> {
        let doc = self.export_backup().await;
        let path = dir.join(BackupDocument::file_name(doc.export_date.date_naive()));
        tokio::fs::write(&path, doc.to_json_pretty()?).await?;

        info!(path = %path.display(), items = doc.items.len(), "Backup exported");
        Ok(path)
    }

    /// Replaces catalog and ledger with the backup's. Returns `false` when
    /// the operator declined.
    pub async fn import_backup(
        &self,
        doc: BackupDocument,
        confirmation: Confirmation,
    ) -> ApiResult<bool> {
        if !confirmation.is_confirmed() {
            debug!("Import declined");
            return Ok(false);
        }

        {
            let mut state = self.inner.state.lock().await;
            self.inner.repo().save_ledger(&doc.items, &doc.transactions).await?;
            state.items = doc.items;
            state.transactions = doc.transactions;
        }

        if let Some(name) = doc.store_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            self.inner.apply_store_name(name).await?;
        }

        info!("Backup imported");
        self.inner.touch();
        Ok(true)
    }

    /// Reads and validates a backup file, then imports it.
    ///
    /// A malformed file is an error even when the import is declined.
    pub async fn import_backup_file(
        &self,
        path: &Path,
        confirmation: Confirmation,
    ) -> ApiResult<bool> {
        let text = tokio::fs::read_to_string(path).await?;
        let doc = BackupDocument::from_json(&text)?;
        self.import_backup(doc, confirmation).await
    }

    // =========================================================================
    // Insights
    // =========================================================================

    pub async fn dashboard(&self, today: NaiveDate) -> DashboardStats {
        let state = self.inner.state.lock().await;
        insights::dashboard(&state.items, &state.transactions, today)
    }

    /// Free-text question to the assistant with an inventory summary.
    pub async fn ask_assistant(&self, question: &str) -> String {
        let context = {
            let state = self.inner.state.lock().await;
            insights::assistant_context(&state.items)
        };
        self.inner.assistant.ask(question, &context).await
    }

    pub async fn medicine_insights(&self, medicine_name: &str) -> String {
        self.inner.assistant.medicine_insights(medicine_name).await
    }

    /// Stops the debounce scheduler and closes the store. A pending
    /// debounced sync is dropped.
    pub async fn shutdown(&self) {
        if let Err(e) = self.inner.debounce.shutdown().await {
            debug!(error = %e, "Debounce scheduler already stopped");
        }
        self.inner.store.close().await;
    }
}

impl Inner {
    fn repo(&self) -> StateRepository {
        self.store.state()
    }

    fn touch(&self) {
        if let Err(e) = self.debounce.poke() {
            warn!(error = %e, "Could not schedule sync");
        }
    }

    async fn snapshot(&self) -> ApiResult<(Vec<(&'static str, Value)>, Option<SessionRecord>)> {
        let state = self.state.lock().await;
        Ok((state.collections()?, state.session.clone()))
    }

    async fn debounced_sync(&self) {
        let connected = self.state.lock().await.is_connected();
        if !connected {
            debug!("Not connected, debounced sync skipped");
            return;
        }

        match self.snapshot().await {
            Ok((collections, session)) => {
                self.run_cycle(&collections, session.as_ref()).await;
            }
            Err(e) => warn!(error = %e, "Could not prepare sync payload"),
        }
    }

    async fn run_cycle(
        &self,
        collections: &[(&'static str, Value)],
        session: Option<&SessionRecord>,
    ) -> SyncOutcome {
        let outcome = self.orchestrator.synchronize(collections, session).await;
        if let Some(at) = outcome.synced_at {
            if let Err(e) = self.repo().save_last_sync(at).await {
                warn!(error = %e, "Could not save last sync time");
            }
        }
        outcome
    }

    async fn apply_store_name(&self, name: &str) -> ApiResult<()> {
        let mut state = self.state.lock().await;
        if let Some(mut session) = state.session.clone() {
            session.store_name = name.to_string();
            self.repo().save_session(Some(&session)).await?;
            state.session = Some(session);
        }
        state.store_name = name.to_string();
        Ok(())
    }
}

/// A pulled catalog is taken whole or not at all.
fn valid_catalog(items: &[Item]) -> bool {
    match items.iter().find_map(|item| validate_item(item).err().map(|e| (item, e))) {
        Some((item, e)) => {
            warn!(id = %item.id, error = %e, "Ignoring remote catalog with an invalid item");
            false
        }
        None => true,
    }
}

fn decode<T: serde::de::DeserializeOwned>(collection: &str, value: Option<Value>) -> Option<T> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(collection, error = %e, "Ignoring remote payload that does not decode");
            None
        }
    }
}
