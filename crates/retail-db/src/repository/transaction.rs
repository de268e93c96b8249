//! # Transaction Repository
//!
//! Database operations for the ledger: transactions, their line items, and
//! the range-filtered row sets consumed by the analytics passes.
//!
//! ## Write Path
//! ```text
//! 1. INSERT transaction shell (total 0)
//! 2. INSERT line items as the engine walks the request
//! 3. UPDATE the final total
//!    └── on any failure the engine deletes the transaction;
//!        the lines go with it (ON DELETE CASCADE)
//! ```
//!
//! ## Read Path
//! Analytics never mutates: `in_range` returns per-sale totals,
//! `sold_lines_in_range` the lines joined with their transaction date and
//! catalog labels. Aggregation itself happens in retail-core.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use retail_core::{LineItem, SoldLineRow, Transaction};

/// Repository for ledger operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    /// Inserts a transaction row.
    pub async fn insert(&self, transaction: &Transaction) -> DbResult<()> {
        debug!(id = %transaction.id, date = %transaction.transaction_date, "Inserting transaction");

        sqlx::query(
            r#"
            INSERT INTO transactions (id, transaction_date, created_at, total_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&transaction.id)
        .bind(transaction.transaction_date)
        .bind(transaction.created_at)
        .bind(transaction.total_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes the final total once line processing completes.
    pub async fn update_total(&self, id: &str, total_cents: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions SET total_cents = ?2 WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(total_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    /// Gets a transaction by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, transaction_date, created_at, total_cents
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Deletes a transaction; its line items go with it (ON DELETE CASCADE).
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no such transaction
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting transaction");

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Transaction", id));
        }

        Ok(())
    }

    /// Counts ledger transactions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Line Items
    // -------------------------------------------------------------------------

    /// Records a line item.
    ///
    /// ## Snapshot Pattern
    /// The unit price is copied onto the line. Later catalog price changes
    /// never rewrite ledger history.
    pub async fn add_line(&self, line: &LineItem) -> DbResult<()> {
        debug!(transaction_id = %line.transaction_id, item_code = %line.item_code, "Adding line item");

        sqlx::query(
            r#"
            INSERT INTO line_items (
                id, transaction_id, item_code,
                quantity, unit_price_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&line.id)
        .bind(&line.transaction_id)
        .bind(&line.item_code)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets all line items of a transaction, in recorded order.
    pub async fn get_lines(&self, transaction_id: &str) -> DbResult<Vec<LineItem>> {
        let lines = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT id, transaction_id, item_code,
                   quantity, unit_price_cents, created_at
            FROM line_items
            WHERE transaction_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    // -------------------------------------------------------------------------
    // Analytics Reads
    // -------------------------------------------------------------------------

    /// Transactions whose date falls in the inclusive range.
    pub async fn in_range(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Vec<Transaction>> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, transaction_date, created_at, total_cents
            FROM transactions
            WHERE transaction_date BETWEEN ?1 AND ?2
            ORDER BY transaction_date, created_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Sold lines in the inclusive range, joined with their transaction date
    /// and the item's current name/category labels.
    pub async fn sold_lines_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<SoldLineRow>> {
        let rows = sqlx::query_as::<_, SoldLineRow>(
            r#"
            SELECT t.transaction_date AS transaction_date,
                   i.name             AS item_name,
                   i.category         AS category,
                   l.quantity         AS quantity,
                   l.unit_price_cents AS unit_price_cents
            FROM line_items l
            INNER JOIN transactions t ON t.id = l.transaction_id
            INNER JOIN items i        ON i.item_code = l.item_code
            WHERE t.transaction_date BETWEEN ?1 AND ?2
            ORDER BY t.transaction_date, i.name
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use retail_core::Item;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn transaction(d: u32, total_cents: i64) -> Transaction {
        Transaction {
            id: Uuid::new_v4().to_string(),
            transaction_date: date(d),
            created_at: Utc::now(),
            total_cents,
        }
    }

    fn line(transaction_id: &str, code: &str, qty: i64, unit_price_cents: i64) -> LineItem {
        LineItem {
            id: Uuid::new_v4().to_string(),
            transaction_id: transaction_id.to_string(),
            item_code: code.to_string(),
            quantity: qty,
            unit_price_cents,
            created_at: Utc::now(),
        }
    }

    async fn test_db() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        for (code, name, category, price) in [
            ("P001", "Pizza", "Food", 1000),
            ("B001", "Burger", "Food", 500),
            ("S001", "Soda", "Beverage", 150),
        ] {
            db.items()
                .insert(&Item {
                    item_code: code.to_string(),
                    name: name.to_string(),
                    category: category.to_string(),
                    price_cents: price,
                    starting_quantity: 100,
                    current_quantity: 100,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_insert_update_get() {
        let db = test_db().await;
        let repo = db.transactions();

        let t = transaction(1, 0);
        repo.insert(&t).await.unwrap();
        repo.update_total(&t.id, 2500).await.unwrap();

        let found = repo.get_by_id(&t.id).await.unwrap().unwrap();
        assert_eq!(found.total_cents, 2500);
        assert_eq!(found.transaction_date, date(1));
    }

    #[tokio::test]
    async fn test_update_total_missing() {
        let db = test_db().await;
        let err = db
            .transactions()
            .update_total("missing", 100)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_lines() {
        let db = test_db().await;
        let repo = db.transactions();

        let t = transaction(1, 2000);
        repo.insert(&t).await.unwrap();
        repo.add_line(&line(&t.id, "P001", 2, 1000)).await.unwrap();
        assert_eq!(repo.get_lines(&t.id).await.unwrap().len(), 1);

        repo.delete(&t.id).await.unwrap();
        assert!(repo.get_by_id(&t.id).await.unwrap().is_none());
        assert!(repo.get_lines(&t.id).await.unwrap().is_empty());

        // Second delete of the same id is a NotFound, not a silent no-op.
        let err = repo.delete(&t.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_line_requires_existing_item() {
        let db = test_db().await;
        let repo = db.transactions();

        let t = transaction(1, 0);
        repo.insert(&t).await.unwrap();

        let err = repo
            .add_line(&line(&t.id, "GHOST", 1, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_range_queries() {
        let db = test_db().await;
        let repo = db.transactions();

        let t1 = transaction(1, 2000);
        let t2 = transaction(2, 650);
        let t3 = transaction(9, 150);
        for t in [&t1, &t2, &t3] {
            repo.insert(t).await.unwrap();
        }
        repo.add_line(&line(&t1.id, "P001", 2, 1000)).await.unwrap();
        repo.add_line(&line(&t2.id, "B001", 1, 500)).await.unwrap();
        repo.add_line(&line(&t2.id, "S001", 1, 150)).await.unwrap();
        repo.add_line(&line(&t3.id, "S001", 1, 150)).await.unwrap();

        let in_window = repo.in_range(date(1), date(2)).await.unwrap();
        assert_eq!(in_window.len(), 2);
        assert_eq!(in_window[0].transaction_date, date(1));

        let rows = repo.sold_lines_in_range(date(1), date(2)).await.unwrap();
        assert_eq!(rows.len(), 3);
        // Joined labels come from the catalog.
        assert_eq!(rows[0].item_name, "Pizza");
        assert_eq!(rows[0].category, "Food");
        assert_eq!(rows[0].quantity, 2);

        // Day 9 is outside the window.
        assert!(rows.iter().all(|r| r.transaction_date <= date(2)));

        let whole_month = repo.sold_lines_in_range(date(1), date(30)).await.unwrap();
        assert_eq!(whole_month.len(), 4);
    }
}
