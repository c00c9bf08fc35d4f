//! # medflow-core: Pure Business Logic for MedFlow
//!
//! Everything a pharmacy counter needs to reason about without touching a
//! disk or a socket: the item catalog types, cart math and checkout, the
//! backup document and dashboard statistics.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        MedFlow Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/medflow (controller + CLI)                 │   │
//! │  │   add_item ──► complete_sale ──► connect ──► sync_now          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ medflow-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │ backup  │ │insights │  │   │
//! │  │   │  Item   │ │  Money  │ │  Cart   │ │ Backup  │ │Dashboard│  │   │
//! │  │   │ Session │ │ TaxRate │ │checkout │ │Document │ │  Stats  │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌──────────────────────┐  ┌───▼──────────────────────────────────┐    │
//! │  │ medflow-store        │  │ medflow-sync                         │    │
//! │  │ local key-value      │  │ remote providers + orchestrator      │    │
//! │  └──────────────────────┘  └──────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Transaction, SessionRecord, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - Cart operations and checkout
//! - [`backup`] - Backup document export/import
//! - [`catalog`] - Starter and demo catalog data
//! - [`insights`] - Dashboard statistics and assistant context
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use medflow_core::money::Money;
//! use medflow_core::SALES_TAX_RATE;
//!
//! let subtotal = Money::from_cents(2500); // $25.00
//! let tax = subtotal.calculate_tax(SALES_TAX_RATE);
//! assert_eq!(tax.cents(), 125);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod insights;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use backup::BackupDocument;
pub use cart::{Cart, CartTotals};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat sales tax applied to every transaction subtotal (5%).
pub const SALES_TAX_RATE: TaxRate = TaxRate::from_bps(500);

/// Customer label used when the cashier leaves the name blank.
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";

/// Store name given to a freshly connected session.
pub const DEFAULT_STORE_NAME: &str = "My Medical Store";

/// Items with stock below this count are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 20;

/// Items with stock below this count are listed as critical on the dashboard.
pub const CRITICAL_STOCK_THRESHOLD: i64 = 10;

/// Items expiring within this many months are flagged as expiring soon.
pub const EXPIRY_WARNING_MONTHS: u32 = 3;

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;
