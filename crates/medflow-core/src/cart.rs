//! # Cart & Checkout
//!
//! The counter cart and the checkout that turns it into a [`Transaction`].
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  add_item(item, qty) ──────► line exists? qty += n : push snapshot     │
//! │                                                                         │
//! │  change_quantity(id, Δ) ───► qty = max(0, qty + Δ); 0 removes the line │
//! │                                                                         │
//! │  remove_item(id) ──────────► line dropped                              │
//! │                                                                         │
//! │  checkout(catalog, method) ─► Transaction + stock decremented          │
//! │                              (floored at zero, summed per item id)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Item, PaymentMethod, Transaction, TransactionLineItem};
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, SALES_TAX_RATE, WALK_IN_CUSTOMER};

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by item id (adding the same item increases quantity)
/// - Every line has quantity > 0
/// - A line never exceeds the stock of its snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub lines: Vec<TransactionLineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds `quantity` of `item`, or increases the existing line.
    pub fn add_item(&mut self, item: &Item, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            let new_qty = line.quantity + quantity;
            check_line(item, new_qty)?;
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge { max: MAX_CART_ITEMS });
        }
        check_line(item, quantity)?;

        self.lines.push(TransactionLineItem {
            item: item.clone(),
            quantity,
        });
        Ok(())
    }

    /// Changes a line's quantity by `delta`. A result of zero removes it.
    pub fn change_quantity(&mut self, item_id: &str, delta: i64) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.item.id == item_id)
            .ok_or_else(|| CoreError::NotInCart(item_id.to_string()))?;

        let new_qty = (line.quantity + delta).max(0);
        if new_qty > 0 {
            check_line(&line.item, new_qty)?;
        }
        line.quantity = new_qty;

        self.lines.retain(|l| l.quantity > 0);
        Ok(())
    }

    /// Removes a line by item id.
    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.item.id != item_id);

        if self.lines.len() == initial_len {
            Err(CoreError::NotInCart(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(|l| l.line_total()).sum()
    }

    /// Tax is computed once on the subtotal, not per line.
    pub fn tax(&self) -> Money {
        self.subtotal().calculate_tax(SALES_TAX_RATE)
    }

    pub fn total(&self) -> Money {
        self.subtotal() + self.tax()
    }

    /// Completes the sale.
    ///
    /// Builds an immutable [`Transaction`] from the cart and decrements
    /// `catalog` stock for every sold item. The cart itself is left intact;
    /// callers clear it once the transaction is recorded.
    ///
    /// A blank or missing customer is recorded as [`WALK_IN_CUSTOMER`].
    pub fn checkout(
        &self,
        catalog: &mut [Item],
        payment_method: PaymentMethod,
        customer_name: Option<&str>,
        at: DateTime<Utc>,
    ) -> CoreResult<Transaction> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let subtotal = self.subtotal();
        let tax = self.tax();

        let customer_name = customer_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(WALK_IN_CUSTOMER)
            .to_string();

        let transaction = Transaction {
            id: Transaction::receipt_id(at),
            items: self.lines.clone(),
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            discount_cents: 0,
            total_cents: (subtotal + tax).cents(),
            payment_method,
            timestamp: at,
            customer_name,
        };

        decrement_stock(catalog, &transaction.items);
        Ok(transaction)
    }
}

/// Subtracts sold quantities from the catalog.
///
/// Quantities are summed per item id first; stock never drops below zero.
/// Lines whose item is no longer in the catalog are ignored.
pub fn decrement_stock(catalog: &mut [Item], lines: &[TransactionLineItem]) {
    let mut sold: HashMap<&str, i64> = HashMap::new();
    for line in lines {
        *sold.entry(line.item.id.as_str()).or_insert(0) += line.quantity;
    }

    for item in catalog.iter_mut() {
        if let Some(qty) = sold.get(item.id.as_str()) {
            item.stock = (item.stock - qty).max(0);
        }
    }
}

fn check_line(item: &Item, quantity: i64) -> CoreResult<()> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    if quantity > item.stock {
        return Err(CoreError::InsufficientStock {
            item: item.name.clone(),
            available: item.stock,
            requested: quantity,
        });
    }
    Ok(())
}

/// Cart totals summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            line_count: cart.lines.len(),
            total_quantity: cart.total_quantity(),
            subtotal_cents: cart.subtotal().cents(),
            tax_cents: cart.tax().cents(),
            total_cents: cart.total().cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
