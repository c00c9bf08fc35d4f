//! # Seed Data Generator
//!
//! Fills a local store with a demo medicine catalog for development.
//!
//! ## Usage
//! ```bash
//! # 200 items (default)
//! cargo run -p medflow-store --bin seed
//!
//! # Custom amount and database path
//! cargo run -p medflow-store --bin seed -- --count 1000 --db ./data/medflow.db
//! ```
//!
//! Items are generated across every catalog category with a spread of
//! stock levels and expiry dates, so the dashboard has low-stock and
//! expiring entries to show.

use std::env;

use medflow_core::catalog::demo_item;
use medflow_core::Item;
use medflow_store::{LocalStore, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./medflow_dev.db");
    let mut force = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--force" | "-f" => force = true,
            "--help" | "-h" => {
                println!("MedFlow Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of items to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./medflow_dev.db)");
                println!("  -f, --force        Replace an existing catalog");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("MedFlow Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Items:    {}", count);
    println!();

    let store = LocalStore::open(StoreConfig::new(&db_path)).await?;
    println!("✓ Opened local store");

    if let Some(existing) = store.state().load_items().await {
        if !existing.is_empty() && !force {
            println!("⚠ Store already has {} items", existing.len());
            println!("  Pass --force to replace them.");
            return Ok(());
        }
    }

    let start = std::time::Instant::now();
    let items: Vec<Item> = (0..count).map(demo_item).collect();
    store.state().save_items(&items).await?;

    let low_stock = items.iter().filter(|i| i.is_low_stock()).count();
    println!("✓ Generated {} items in {:?}", items.len(), start.elapsed());
    println!("  Low stock: {}", low_stock);

    store.close().await;
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
