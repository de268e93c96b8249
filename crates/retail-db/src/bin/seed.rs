//! # Seed Data Generator
//!
//! Populates the database with a small catalog and a pile of back-dated
//! transactions so the analytics reports have something to chew on.
//!
//! ## Usage
//! ```bash
//! # Default: 1,000 transactions over the trailing 16 days
//! cargo run -p retail-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p retail-db --bin seed -- --count 200 --db ./data/retail.db
//! ```
//!
//! Ledger rows are written straight through the repositories (price
//! snapshots included) without touching stock counters, so the seeded
//! history never interferes with live stock checks.

use chrono::{Duration, NaiveDate, Utc};
use std::env;
use uuid::Uuid;

use retail_core::{Item, LineItem, Transaction};
use retail_db::{Database, DbConfig};

/// Catalog seeded for dev environments: (code, name, category, price cents).
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("IT1001", "Burger", "Food", 550),
    ("IT1002", "Pizza", "Food", 1000),
    ("IT1003", "Fries", "Food", 300),
    ("IT1004", "Pasta", "Food", 850),
    ("IT1005", "Soda", "Beverage", 150),
    ("IT1006", "Juice", "Beverage", 250),
];

/// Days of history to generate, today included.
const HISTORY_DAYS: i64 = 16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 1000;
    let mut db_path = String::from("./retail_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Retail Engine Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of transactions to generate (default: 1000)");
                println!("  -d, --db <PATH>    Database file path (default: ./retail_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Retail Engine Seed Data Generator");
    println!("=================================");
    println!("Database:     {}", db_path);
    println!("Transactions: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("Connected, migrations applied");

    if db.transactions().count().await? > 0 {
        println!("Database already holds ledger data; skipping seed.");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog first; transactions reference it by code.
    if db.items().count().await? == 0 {
        for (seq, (code, name, category, price_cents)) in CATALOG.iter().enumerate() {
            let now = Utc::now();
            let starting_quantity = 40 + (seq as i64 * 13) % 60;
            db.items()
                .insert(&Item {
                    item_code: code.to_string(),
                    name: name.to_string(),
                    category: category.to_string(),
                    price_cents: *price_cents,
                    starting_quantity,
                    current_quantity: starting_quantity,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
        }
        println!("Seeded {} catalog items", CATALOG.len());
    }

    let today = Utc::now().date_naive();
    let window_start = today - Duration::days(HISTORY_DAYS - 1);

    println!("Generating {count} transactions between {window_start} and {today}...");

    let start = std::time::Instant::now();
    for seq in 0..count {
        seed_transaction(&db, window_start, seq).await?;

        if (seq + 1) % 200 == 0 {
            println!("  Generated {} transactions...", seq + 1);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("Generated {} transactions in {:?}", count, elapsed);
    println!("Seed complete!");

    Ok(())
}

/// Writes one back-dated transaction with 1-5 lines. `seq` drives a cheap
/// deterministic scramble so repeated runs produce the same history.
async fn seed_transaction(
    db: &Database,
    window_start: NaiveDate,
    seq: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let scramble = seq * 2654435761 % 4294967296; // Knuth multiplicative hash
    let date = window_start + Duration::days((scramble % HISTORY_DAYS as usize) as i64);
    let now = Utc::now();

    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        transaction_date: date,
        created_at: now,
        total_cents: 0,
    };
    db.transactions().insert(&transaction).await?;

    let line_count = 1 + (scramble / 7) % 5;
    let mut total_cents = 0;
    for line_idx in 0..line_count {
        let (code, _, _, price_cents) = CATALOG[(scramble / 11 + line_idx * 5) % CATALOG.len()];
        let quantity = 1 + ((scramble / 13 + line_idx) % 10) as i64;

        db.transactions()
            .add_line(&LineItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction.id.clone(),
                item_code: code.to_string(),
                quantity,
                unit_price_cents: price_cents,
                created_at: now,
            })
            .await?;

        total_cents += quantity * price_cents;
    }

    db.transactions()
        .update_total(&transaction.id, total_cents)
        .await?;

    Ok(())
}
