//! Dashboard statistics and the inventory summary handed to the assistant.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Item, Transaction};
use crate::{CRITICAL_STOCK_THRESHOLD, EXPIRY_WARNING_MONTHS};

/// How many critical items the dashboard lists.
const CRITICAL_LIST_LEN: usize = 3;

/// How many of the newest catalog entries count as "recent arrivals".
const RECENT_ARRIVALS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sales_cents: i64,
    pub transaction_count: usize,
    pub low_stock_count: usize,
    pub expiring_soon_count: usize,
    /// First few items with critically low stock, in catalog order.
    pub critical_items: Vec<Item>,
}

/// Computes dashboard statistics as of `today`.
pub fn dashboard(items: &[Item], transactions: &[Transaction], today: NaiveDate) -> DashboardStats {
    DashboardStats {
        total_sales_cents: transactions.iter().map(|t| t.total_cents).sum(),
        transaction_count: transactions.len(),
        low_stock_count: items.iter().filter(|i| i.is_low_stock()).count(),
        expiring_soon_count: items
            .iter()
            .filter(|i| i.expires_within(today, EXPIRY_WARNING_MONTHS))
            .count(),
        critical_items: items
            .iter()
            .filter(|i| i.stock < CRITICAL_STOCK_THRESHOLD)
            .take(CRITICAL_LIST_LEN)
            .cloned()
            .collect(),
    }
}

/// One-line inventory summary sent along with assistant questions.
///
/// The catalog is kept newest-first, so the head of the list is the most
/// recent arrivals.
pub fn assistant_context(items: &[Item]) -> String {
    let low_stock: Vec<&str> = items
        .iter()
        .filter(|i| i.is_low_stock())
        .map(|i| i.name.as_str())
        .collect();
    let recent: Vec<&str> = items
        .iter()
        .take(RECENT_ARRIVALS)
        .map(|i| i.name.as_str())
        .collect();

    format!(
        "Low stock items: {}. Recent arrivals: {}.",
        low_stock.join(", "),
        recent.join(", ")
    )
}
