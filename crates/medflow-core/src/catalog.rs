//! Starter and demo catalog data.
//!
//! A fresh install with nothing in the local store starts from
//! [`starter_catalog`]. The `seed` binary in medflow-store uses
//! [`demo_item`] to fill a development database with realistic entries.

use chrono::NaiveDate;

use crate::types::{Item, ITEM_CATEGORIES};

/// The catalog shown before anything has been saved locally.
pub fn starter_catalog() -> Vec<Item> {
    vec![Item {
        id: "1".to_string(),
        name: "Paracetamol 500mg".to_string(),
        generic_name: "Acetaminophen".to_string(),
        category: "Analgesics".to_string(),
        price_cents: 1550,
        stock: 250,
        expiry_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap_or_default(),
        batch_number: "BT-9921".to_string(),
        manufacturer: "HealthCorp".to_string(),
        description: "Relief of mild to moderate pain and fever.".to_string(),
    }]
}

/// (brand stem, generic name) per category, same order as [`ITEM_CATEGORIES`].
const DEMO_NAMES: &[&[(&str, &str)]] = &[
    &[("Dolo", "Paracetamol"), ("Brufen", "Ibuprofen"), ("Disprin", "Aspirin")],
    &[("Amoxil", "Amoxicillin"), ("Azee", "Azithromycin"), ("Ciplox", "Ciprofloxacin")],
    &[("Cetzine", "Cetirizine"), ("Allegra", "Fexofenadine"), ("Avil", "Pheniramine")],
    &[("Pan", "Pantoprazole"), ("Digene", "Antacid"), ("Eldoper", "Loperamide")],
    &[("Glycomet", "Metformin"), ("Amaryl", "Glimepiride"), ("Januvia", "Sitagliptin")],
    &[("Amlong", "Amlodipine"), ("Telma", "Telmisartan"), ("Ecosprin", "Aspirin")],
    &[("Betnovate", "Betamethasone"), ("Candid", "Clotrimazole"), ("Soframycin", "Framycetin")],
];

const STRENGTHS: &[&str] = &["100mg", "250mg", "500mg", "650mg"];

const MANUFACTURERS: &[&str] = &["HealthCorp", "Sunrise Labs", "Medico Ltd", "Zen Pharma"];

/// Deterministic demo item for index `seed`.
pub fn demo_item(seed: usize) -> Item {
    let category_idx = seed % ITEM_CATEGORIES.len();
    let names = DEMO_NAMES[category_idx];
    let (brand, generic) = names[(seed / ITEM_CATEGORIES.len()) % names.len()];
    let strength = STRENGTHS[seed % STRENGTHS.len()];

    // Expiry spread over the next ~3 years so the dashboard has something to flag
    let base = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default();
    let expiry_date = base + chrono::Duration::days(((seed * 37) % 1095) as i64);

    Item {
        id: format!("P-DEMO-{:05}", seed),
        name: format!("{} {}", brand, strength),
        generic_name: generic.to_string(),
        category: ITEM_CATEGORIES[category_idx].to_string(),
        price_cents: 199 + ((seed * 17) % 4800) as i64,
        stock: (seed % 301) as i64,
        expiry_date,
        batch_number: format!("BT-{:04}", 1000 + seed % 9000),
        manufacturer: MANUFACTURERS[seed % MANUFACTURERS.len()].to_string(),
        description: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_item;

    #[test]
    fn test_starter_catalog() {
        let items = starter_catalog();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price_cents, 1550);
        assert!(validate_item(&items[0]).is_ok());
    }

    #[test]
    fn test_demo_items_are_valid_and_unique() {
        let items: Vec<Item> = (0..50).map(demo_item).collect();
        for item in &items {
            assert!(validate_item(item).is_ok(), "{:?}", item);
        }
        let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }
}
