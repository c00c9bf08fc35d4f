//! # Validation Module
//!
//! Input validation utilities for MedFlow.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI argument parsing (clap)                                   │
//! │  ├── Types, enums, required arguments                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Item fields, quantities, backup contents                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Controller                                                    │
//! │  └── Duplicate ids, stock availability                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use medflow_core::validation::{validate_item_name, validate_quantity};
//!
//! validate_item_name("Paracetamol 500mg").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::Item;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an item name: non-empty, at most 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a free-text search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a connect identifier (email-like, must contain `@`).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "expected name@domain".to_string(),
        }),
    }
}

/// Validates a store name: non-empty, at most 100 characters.
pub fn validate_store_name(name: &str) -> ValidationResult<()> {
    validate_text("store name", name, 100)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free samples).
///
/// ```rust
/// use medflow_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock count. Zero is allowed (sold out).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates every user-editable field of an item.
pub fn validate_item(item: &Item) -> ValidationResult<()> {
    validate_text("id", &item.id, 64)?;
    validate_item_name(&item.name)?;
    validate_text("generic name", &item.generic_name, 200)?;
    validate_text("category", &item.category, 100)?;
    validate_price_cents(item.price_cents)?;
    validate_stock(item.stock)?;
    validate_text("batch number", &item.batch_number, 64)?;
    validate_text("manufacturer", &item.manufacturer, 200)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::item;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Amoxicillin 250mg").is_ok());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("owner@store.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@store.com").is_err());
    }

    #[test]
    fn test_validate_store_name() {
        assert!(validate_store_name("City Pharmacy").is_ok());
        assert!(validate_store_name("   ").is_err());
        assert!(validate_store_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_item() {
        assert!(validate_item(&item("P-1", 1000, 5)).is_ok());

        let mut bad = item("P-1", 1000, 5);
        bad.stock = -1;
        assert!(validate_item(&bad).is_err());

        let mut bad = item("P-1", -5, 5);
        bad.price_cents = -5;
        assert!(validate_item(&bad).is_err());

        let mut bad = item("P-1", 100, 5);
        bad.manufacturer = String::new();
        let err = validate_item(&bad).unwrap_err();
        assert_eq!(err.to_string(), "manufacturer is required");
    }
}
