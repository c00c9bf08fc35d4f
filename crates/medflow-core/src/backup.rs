//! # Backup Document
//!
//! A full snapshot of the catalog and ledger as one JSON document.
//!
//! ```text
//! {
//!   "items":        [Item, ...],
//!   "transactions": [Transaction, ...],
//!   "storeName":    "City Pharmacy",
//!   "exportDate":   "2026-10-19T09:30:00Z"
//! }
//! ```
//!
//! Import also accepts the older key names `products`, `sales` and
//! `pharmacyName` for the same three fields.
//!
//! Import is all-or-nothing: a document missing either collection, or with
//! an item that fails validation, is rejected before anything is replaced.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Item, Transaction};
use crate::validation::validate_item;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub items: Vec<Item>,
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    pub export_date: DateTime<Utc>,
}

/// Shape used while importing, so a missing collection gets a precise error
/// instead of a generic decode failure.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBackup {
    #[serde(alias = "products")]
    items: Option<Vec<Item>>,
    #[serde(alias = "sales")]
    transactions: Option<Vec<Transaction>>,
    #[serde(default, alias = "pharmacyName")]
    store_name: Option<String>,
    #[serde(default)]
    export_date: Option<DateTime<Utc>>,
}

impl BackupDocument {
    pub fn new(
        items: Vec<Item>,
        transactions: Vec<Transaction>,
        store_name: Option<String>,
        export_date: DateTime<Utc>,
    ) -> Self {
        BackupDocument {
            items,
            transactions,
            store_name,
            export_date,
        }
    }

    /// Default file name for an export taken on `date`.
    pub fn file_name(date: NaiveDate) -> String {
        format!("medflow_backup_{}.json", date.format("%Y-%m-%d"))
    }

    /// Pretty-printed JSON for writing to disk.
    pub fn to_json_pretty(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::InvalidBackup(e.to_string()))
    }

    /// Parses and validates a backup document.
    pub fn from_json(text: &str) -> CoreResult<Self> {
        let raw: RawBackup =
            serde_json::from_str(text).map_err(|e| CoreError::InvalidBackup(e.to_string()))?;

        let items = raw
            .items
            .ok_or_else(|| CoreError::InvalidBackup("missing \"items\"".to_string()))?;
        let transactions = raw
            .transactions
            .ok_or_else(|| CoreError::InvalidBackup("missing \"transactions\"".to_string()))?;

        for item in &items {
            validate_item(item)
                .map_err(|e| CoreError::InvalidBackup(format!("item {}: {}", item.id, e)))?;
        }

        Ok(BackupDocument {
            items,
            transactions,
            store_name: raw.store_name,
            export_date: raw.export_date.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::types::tests::item;
    use crate::types::PaymentMethod;

    fn sample() -> BackupDocument {
        let mut catalog = vec![item("A", 1000, 10), item("B", 500, 4)];
        let mut cart = Cart::new();
        cart.add_item(&catalog[0], 2).unwrap();
        let txn = cart
            .checkout(&mut catalog, PaymentMethod::Card, Some("Meera"), Utc::now())
            .unwrap();
        BackupDocument::new(catalog, vec![txn], Some("City Pharmacy".into()), Utc::now())
    }

    #[test]
    fn test_export_then_import_is_identical() {
        let doc = sample();
        let json = doc.to_json_pretty().unwrap();
        let back = BackupDocument::from_json(&json).unwrap();

        assert_eq!(back.items, doc.items);
        assert_eq!(back.transactions, doc.transactions);
        assert_eq!(back.store_name.as_deref(), Some("City Pharmacy"));
    }

    #[test]
    fn test_import_requires_both_collections() {
        let err = BackupDocument::from_json(r#"{"items": []}"#).unwrap_err();
        assert!(err.to_string().contains("transactions"));

        let err = BackupDocument::from_json(r#"{"transactions": []}"#).unwrap_err();
        assert!(err.to_string().contains("items"));

        assert!(BackupDocument::from_json("not json").is_err());
        assert!(BackupDocument::from_json(r#"{"items": [], "transactions": []}"#).is_ok());
    }

    #[test]
    fn test_import_accepts_older_key_names() {
        let json = r#"{
            "products": [{"id":"1","name":"Panadol","genericName":"Paracetamol","category":"Analgesics","price":12.5,"stock":40,"expiryDate":"2027-01-01","batchNumber":"PN-101","manufacturer":"GSK","description":""}],
            "sales": [{"id":"S-100001","items":[],"total":10.5,"tax":0.5,"discount":0,"paymentMethod":"cash","timestamp":"2026-10-01T09:00:00.000Z","customerName":"Walk-in Customer"}],
            "pharmacyName": "Shifa Pharmacy",
            "exportDate": "2026-10-02T10:00:00.000Z"
        }"#;

        let doc = BackupDocument::from_json(json).unwrap();
        assert_eq!(doc.items[0].price_cents, 1250);
        assert_eq!(doc.transactions[0].subtotal_cents, 1000);
        assert_eq!(doc.store_name.as_deref(), Some("Shifa Pharmacy"));
    }

    #[test]
    fn test_import_rejects_invalid_item() {
        let mut doc = sample();
        doc.items[0].stock = -3;
        let json = serde_json::to_string(&doc).unwrap();
        assert!(matches!(
            BackupDocument::from_json(&json),
            Err(CoreError::InvalidBackup(_))
        ));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(BackupDocument::file_name(date), "medflow_backup_2026-10-19.json");
    }
}
