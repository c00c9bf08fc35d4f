//! # Domain Types
//!
//! Core domain types used throughout MedFlow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │      Item       │   │    Transaction      │   │  SessionRecord  │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id  "P-…"      │◄──│  items (snapshots)  │   │  id  "usr_…"    │   │
//! │  │  name, generic  │   │  subtotal/tax/total │   │  provider       │   │
//! │  │  price_cents    │   │  payment_method     │   │  record server  │   │
//! │  │  stock, expiry  │   │  customer_name      │   │  document store │   │
//! │  └─────────────────┘   └─────────────────────┘   └─────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │ PaymentMethod   │   │  ProviderKind   │       │
//! │  │  bps (u32)      │   │  cash/card/upi  │   │  none           │       │
//! │  │  500 = 5%       │   └─────────────────┘   │  record_server  │       │
//! │  └─────────────────┘                         │  document_store │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All persisted types serialize as camelCase JSON. The same JSON is written
//! to the local store, pushed to remote providers and embedded in backups.
//! Amounts are integer cents in memory and decimal numbers on the wire
//! (`price`, `subtotal`, `tax`, `discount`, `total`).

use chrono::{DateTime, Months, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{decimal, Money};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 500 bps = 5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage for display (500 → 5.0).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Item
// =============================================================================

/// Catalog categories offered when creating an item.
///
/// The catalog itself stores the category as free text so that records
/// pulled from a remote store with other labels still load.
pub const ITEM_CATEGORIES: &[&str] = &[
    "Analgesics",
    "Antibiotics",
    "Antihistamines",
    "Gastrointestinal",
    "Antidiabetics",
    "Cardiovascular",
    "Dermatological",
];

/// A medicine or product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Catalog identifier, `P-<millis><suffix>` for locally created items.
    pub id: String,

    /// Brand / display name.
    pub name: String,

    /// Generic name or composition (e.g. "Paracetamol").
    pub generic_name: String,

    pub category: String,

    /// Unit price in cents. Never negative.
    #[serde(rename = "price", with = "decimal")]
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub expiry_date: NaiveDate,

    pub batch_number: String,

    pub manufacturer: String,

    #[serde(default)]
    pub description: String,
}

impl Item {
    /// Generates a fresh catalog id.
    pub fn generate_id() -> String {
        format!("P-{}{}", Utc::now().timestamp_millis(), random_base36(3))
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// True when stock is under the low-stock alert threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock < crate::LOW_STOCK_THRESHOLD
    }

    /// True when the item expires on or before `today + months`.
    pub fn expires_within(&self, today: NaiveDate, months: u32) -> bool {
        match today.checked_add_months(Months::new(months)) {
            Some(limit) => self.expiry_date <= limit,
            None => false,
        }
    }

    /// Case-insensitive match on name, generic name or category.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self.generic_name.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// UPI / QR payment.
    Upi,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Upi => write!(f, "upi"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "upi" | "qr" => Ok(PaymentMethod::Upi),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "upi".into()],
            }),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A line in a completed transaction.
///
/// Snapshot pattern: the full item as it was at the time of sale, so later
/// catalog edits never rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLineItem {
    #[serde(flatten)]
    pub item: Item,

    pub quantity: i64,
}

impl TransactionLineItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.item.price().multiply_quantity(self.quantity)
    }
}

/// A completed sale. Immutable once created.
///
/// ## Invariant
/// `total_cents = subtotal_cents + tax_cents` where the subtotal is the sum
/// of line totals and the tax is the subtotal at [`crate::SALES_TAX_RATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "TransactionRecord")]
pub struct Transaction {
    /// `S-` followed by the last six digits of the creation timestamp.
    pub id: String,
    pub items: Vec<TransactionLineItem>,
    #[serde(rename = "subtotal", serialize_with = "decimal::serialize")]
    pub subtotal_cents: i64,
    #[serde(rename = "tax", serialize_with = "decimal::serialize")]
    pub tax_cents: i64,
    /// Always zero; discounts are not offered at the counter.
    #[serde(rename = "discount", serialize_with = "decimal::serialize")]
    pub discount_cents: i64,
    #[serde(rename = "total", serialize_with = "decimal::serialize")]
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
    pub customer_name: String,
}

/// Stored form of a sale as read back.
///
/// Ledgers kept by earlier releases record only `total` and `tax`, and may
/// leave the customer out.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRecord {
    id: String,
    items: Vec<TransactionLineItem>,
    #[serde(default, deserialize_with = "decimal::deserialize_optional")]
    subtotal: Option<i64>,
    #[serde(deserialize_with = "decimal::deserialize")]
    tax: i64,
    #[serde(default, deserialize_with = "decimal::deserialize")]
    discount: i64,
    #[serde(deserialize_with = "decimal::deserialize")]
    total: i64,
    payment_method: PaymentMethod,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    customer_name: Option<String>,
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        let customer_name = record
            .customer_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| crate::WALK_IN_CUSTOMER.to_string());

        Transaction {
            id: record.id,
            items: record.items,
            subtotal_cents: record.subtotal.unwrap_or(record.total - record.tax),
            tax_cents: record.tax,
            discount_cents: record.discount,
            total_cents: record.total,
            payment_method: record.payment_method,
            timestamp: record.timestamp,
            customer_name,
        }
    }
}

impl Transaction {
    /// Builds the receipt id for a sale created at `at`.
    pub fn receipt_id(at: DateTime<Utc>) -> String {
        let millis = at.timestamp_millis().to_string();
        let start = millis.len().saturating_sub(6);
        format!("S-{}", &millis[start..])
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Session
// =============================================================================

/// Which remote store a session mirrors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local only (demo / offline mode).
    #[default]
    None,
    /// Self-hosted record server with collection-based REST.
    RecordServer,
    /// Realtime hierarchical document store.
    DocumentStore,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::None => write!(f, "none"),
            ProviderKind::RecordServer => write!(f, "record_server"),
            ProviderKind::DocumentStore => write!(f, "document_store"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" | "local" | "offline" => Ok(ProviderKind::None),
            "record_server" | "pocketbase" => Ok(ProviderKind::RecordServer),
            "document_store" | "firebase" => Ok(ProviderKind::DocumentStore),
            _ => Err(ValidationError::NotAllowed {
                field: "provider".to_string(),
                allowed: vec![
                    "none".into(),
                    "record_server".into(),
                    "document_store".into(),
                ],
            }),
        }
    }
}

/// Connection parameters for the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStoreConfig {
    /// Document root, e.g. `https://store-default-rtdb.example.com/`.
    pub url: String,
    /// Access token sent as the `auth` query parameter.
    pub access_token: String,
}

/// Provider-specific connection parameters captured at connect time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderParams {
    #[serde(default)]
    pub record_server_url: Option<String>,
    #[serde(default)]
    pub document_store: Option<DocumentStoreConfig>,
}

/// The signed-in operator and where their data is mirrored.
///
/// Created locally on connect; no credential verification takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub store_name: String,
    pub is_logged_in: bool,
    pub provider: ProviderKind,
    #[serde(default)]
    pub record_server_url: Option<String>,
    #[serde(default)]
    pub document_store: Option<DocumentStoreConfig>,
}

impl SessionRecord {
    /// Builds a new session for `email` on `provider`.
    ///
    /// ```rust
    /// use medflow_core::types::{ProviderKind, ProviderParams, SessionRecord};
    ///
    /// let s = SessionRecord::connect("asha@clinic.in", ProviderKind::None, ProviderParams::default(), "City Pharmacy");
    /// assert!(s.id.starts_with("usr_"));
    /// assert_eq!(s.name, "asha");
    /// assert!(!s.is_logged_in);
    /// ```
    pub fn connect(
        email: &str,
        provider: ProviderKind,
        params: ProviderParams,
        store_name: &str,
    ) -> Self {
        let email = email.trim();
        let name = email.split('@').next().unwrap_or(email).to_string();

        SessionRecord {
            id: format!("usr_{}", random_base36(9)),
            name,
            email: email.to_string(),
            store_name: store_name.to_string(),
            is_logged_in: provider != ProviderKind::None,
            provider,
            record_server_url: params.record_server_url,
            document_store: params.document_store,
        }
    }

    /// True when debounced syncs should reach the network.
    pub fn is_connected(&self) -> bool {
        self.is_logged_in && self.provider != ProviderKind::None
    }
}

// =============================================================================
// Confirmation
// =============================================================================

/// Explicit answer to a destructive-action prompt (delete, import).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl Confirmation {
    #[inline]
    pub fn is_confirmed(self) -> bool {
        self == Confirmation::Confirmed
    }
}

impl From<bool> for Confirmation {
    fn from(yes: bool) -> Self {
        if yes {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

fn random_base36(len: usize) -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
