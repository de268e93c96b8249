//! # retail-db: Database Layer
//!
//! SQLite persistence for the retail transaction engine, using sqlx for
//! async operations.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (items, transactions)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use retail_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/retail.db")).await?;
//!
//! let pizza = db.items().get_by_code("P001").await?;
//! let today = db.transactions().in_range(date, date).await?;
//! ```
//!
//! The store-level invariants (non-negative stock, cascade from transactions
//! to lines, restricted item deletes) live in `migrations/sqlite/`; the
//! repositories expose the one atomic primitive the engine needs - the
//! conditional stock decrement - plus plain CRUD and the analytics row
//! queries.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::item::ItemRepository;
pub use repository::transaction::TransactionRepository;
