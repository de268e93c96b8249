//! # Item Repository
//!
//! Database operations for catalog items.
//!
//! ## The Stock Decrement Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 Conditional Atomic Decrement                            │
//! │                                                                         │
//! │  ❌ WRONG: check-then-write (race between two sales)                    │
//! │     SELECT current_quantity ...        ← both see 5                    │
//! │     UPDATE ... SET current_quantity=2  ← both write, stock goes wrong  │
//! │                                                                         │
//! │  ✅ CORRECT: single guarded read-modify-write                           │
//! │     UPDATE items                                                       │
//! │     SET current_quantity = current_quantity - ?qty                     │
//! │     WHERE item_code = ?code AND current_quantity >= ?qty               │
//! │                                                                         │
//! │  rows_affected = 1 → stock taken;  0 → insufficient, nothing changed   │
//! │  Two concurrent sales of the same item can never both drive the        │
//! │  counter below zero.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use retail_core::Item;

/// Repository for catalog item operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts a new catalog item.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - item code already exists
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(item_code = %item.item_code, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                item_code, name, category, price_cents,
                starting_quantity, current_quantity,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.item_code)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.starting_quantity)
        .bind(item.current_quantity)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an item by its code.
    ///
    /// ## Returns
    /// * `Ok(Some(Item))` - item found
    /// * `Ok(None)` - no such code
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT item_code, name, category, price_cents,
                   starting_quantity, current_quantity,
                   created_at, updated_at
            FROM items
            WHERE item_code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists the whole catalog, ordered by item code.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT item_code, name, category, price_cents,
                   starting_quantity, current_quantity,
                   created_at, updated_at
            FROM items
            ORDER BY item_code
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Attempts to take `quantity` units of stock in one guarded
    /// read-modify-write.
    ///
    /// ## Returns
    /// * `Ok(true)` - stock decremented
    /// * `Ok(false)` - guard failed: current stock below `quantity` (or the
    ///   code does not exist; callers that need to distinguish look the item
    ///   up first)
    pub async fn try_decrement_stock(&self, code: &str, quantity: i64) -> DbResult<bool> {
        debug!(item_code = %code, quantity = %quantity, "Decrementing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items
            SET current_quantity = current_quantity - ?2,
                updated_at = ?3
            WHERE item_code = ?1 AND current_quantity >= ?2
            "#,
        )
        .bind(code)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds `quantity` units back to stock. The compensation half of the
    /// decrement above; also used when undoing a completed transaction.
    pub async fn restore_stock(&self, code: &str, quantity: i64) -> DbResult<()> {
        debug!(item_code = %code, quantity = %quantity, "Restoring stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items
            SET current_quantity = current_quantity + ?2,
                updated_at = ?3
            WHERE item_code = ?1
            "#,
        )
        .bind(code)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", code));
        }

        Ok(())
    }

    /// Counts catalog items (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
