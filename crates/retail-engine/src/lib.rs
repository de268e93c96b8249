//! # retail-engine: Transaction + Analytics Engines
//!
//! The service-facing layer of the retail workspace. The surrounding
//! transport (HTTP, CSV export, schedulers) talks to the three types
//! exported here and never to the database directly.
//!
//! ## Surface
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          retail-engine                                  │
//! │                                                                         │
//! │  TransactionEngine          AnalyticsEngine         CachedAnalytics     │
//! │  ─────────────────          ───────────────         ───────────────     │
//! │  create_transaction         daily_summary           daily_summary (5m)  │
//! │  create_transaction_on      range_average           range_average (60m) │
//! │  undo_transaction           sales_detail            sales_detail (60m)  │
//! │  get_transaction            item_trend              compare_ranges(60m) │
//! │  get_item                   range_totals            refresh_daily_      │
//! │                             compare_ranges            summary (warm-up) │
//! │                                                                         │
//! │  writes catalog + ledger    reads ledger only       memoizes reads      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transaction engine is the only writer of stock counters; analytics
//! never mutates. Requests are independent: the single point of mutual
//! exclusion is the store-level guarded stock decrement.
//!
//! ## Example
//! ```rust,ignore
//! use retail_db::{Database, DbConfig};
//! use retail_engine::{AnalyticsEngine, CachedAnalytics, CachePolicy, TransactionEngine};
//! use retail_core::LineRequest;
//!
//! let db = Database::new(DbConfig::new("./retail.db")).await?;
//! let sales = TransactionEngine::new(db.clone());
//! let reports = CachedAnalytics::new(AnalyticsEngine::new(db.clone()), CachePolicy::default());
//!
//! let receipt = sales.create_transaction(&[LineRequest::new("P001", 2)]).await?;
//! let summary = reports.daily_summary(receipt.transaction.transaction_date).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod cache;
pub mod error;
pub mod transaction;

// =============================================================================
// Re-exports
// =============================================================================

pub use analytics::AnalyticsEngine;
pub use cache::{CachePolicy, CachedAnalytics, ResultCache};
pub use error::{EngineError, EngineResult};
pub use transaction::TransactionEngine;

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use retail_core::Item;
    use retail_db::{Database, DbConfig};

    pub const P001: &str = "P001";
    pub const S001: &str = "S001";

    /// In-memory database with a three-item catalog:
    /// P001 Pizza (Food, $10.00, stock 50), B001 Burger (Food, $5.00,
    /// stock 50), S001 Soda (Beverage, $1.50, stock 5).
    pub async fn seeded_db() -> Database {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        for (code, name, category, price_cents, stock) in [
            ("P001", "Pizza", "Food", 1000, 50),
            ("B001", "Burger", "Food", 500, 50),
            ("S001", "Soda", "Beverage", 150, 5),
        ] {
            db.items()
                .insert(&Item {
                    item_code: code.to_string(),
                    name: name.to_string(),
                    category: category.to_string(),
                    price_cents,
                    starting_quantity: stock,
                    current_quantity: stock,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }
        db
    }

    /// Current stock of an item, straight from the catalog.
    pub async fn stock_of(db: &Database, code: &str) -> i64 {
        db.items()
            .get_by_code(code)
            .await
            .unwrap()
            .unwrap()
            .current_quantity
    }
}
