//! # Transaction Engine
//!
//! Validates and atomically applies sales against the catalog and the
//! ledger, with compensating rollback.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_transaction                                 │
//! │                                                                         │
//! │  1. VALIDATE REQUEST (no store access yet)                             │
//! │     └── non-empty, every quantity >= 1, codes well-formed              │
//! │                                                                         │
//! │  2. INSERT transaction shell (total 0)                                 │
//! │                                                                         │
//! │  3. PER LINE, IN INPUT ORDER                                           │
//! │     ├── look up item           ── absent? ──────────┐                  │
//! │     ├── guarded stock decrement ── refused? ────────┤                  │
//! │     ├── record price-snapshot line item             │                  │
//! │     └── accumulate running total                    ▼                  │
//! │                                          ┌─────────────────────┐       │
//! │  4. WRITE final total                    │      ROLLBACK       │       │
//! │                                          │ restore every taken │       │
//! │  5. RETURN receipt                       │ quantity, delete the│       │
//! │                                          │ partial transaction │       │
//! │                                          │ (lines cascade),    │       │
//! │                                          │ then surface error  │       │
//! │                                          └─────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded decrement (`current_quantity >= qty` inside the UPDATE) is
//! the single point of mutual exclusion: concurrent sales of the same item
//! cannot both pass the check and drive stock below zero.

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use retail_core::validation::validate_line_requests;
use retail_core::{
    CoreError, Item, LineItem, LineRequest, Money, Transaction, TransactionReceipt,
};
use retail_db::Database;

/// The engine that owns every stock mutation.
///
/// Cloning shares the underlying pool; one instance per process is typical.
#[derive(Debug, Clone)]
pub struct TransactionEngine {
    db: Database,
}

impl TransactionEngine {
    /// Creates a new engine over the given database.
    pub fn new(db: Database) -> Self {
        TransactionEngine { db }
    }

    /// Records a sale dated today.
    ///
    /// See [`TransactionEngine::create_transaction_on`]; this variant stamps
    /// the current calendar day.
    pub async fn create_transaction(
        &self,
        lines: &[LineRequest],
    ) -> EngineResult<TransactionReceipt> {
        self.create_transaction_on(Utc::now().date_naive(), lines)
            .await
    }

    /// Records a sale under an explicit calendar date.
    ///
    /// Processes the requested lines in input order, snapshotting each
    /// item's current price and taking its stock through the guarded
    /// decrement. All-or-nothing: if any line fails, every effect applied by
    /// prior lines is reversed before the error is returned, so a failed
    /// call leaves the catalog and ledger exactly as it found them.
    ///
    /// ## Errors
    /// - [`CoreError::EmptyRequest`] / validation errors - rejected before
    ///   any store access
    /// - [`CoreError::ItemNotFound`] - some requested code is not in the
    ///   catalog
    /// - [`CoreError::InsufficientStock`] - some line asked for more than
    ///   the item currently has
    pub async fn create_transaction_on(
        &self,
        date: NaiveDate,
        lines: &[LineRequest],
    ) -> EngineResult<TransactionReceipt> {
        validate_line_requests(lines)?;

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            transaction_date: date,
            created_at: Utc::now(),
            total_cents: 0,
        };

        debug!(id = %transaction.id, date = %date, lines = lines.len(), "Creating transaction");
        self.db.transactions().insert(&transaction).await?;

        // Stock decrements applied so far, in case we have to unwind.
        let mut applied: Vec<(String, i64)> = Vec::with_capacity(lines.len());

        match self.apply_lines(&transaction, lines, &mut applied).await {
            Ok(receipt) => {
                info!(
                    id = %receipt.transaction.id,
                    total = %receipt.transaction.total(),
                    lines = receipt.lines.len(),
                    "Transaction created"
                );
                Ok(receipt)
            }
            Err(err) => {
                self.rollback(&transaction.id, &applied).await?;
                Err(err)
            }
        }
    }

    /// Walks the requested lines, mutating stock and recording line items.
    /// Every decrement that succeeds is pushed onto `applied` before
    /// anything else can fail, so the caller always knows what to unwind.
    async fn apply_lines(
        &self,
        transaction: &Transaction,
        requests: &[LineRequest],
        applied: &mut Vec<(String, i64)>,
    ) -> EngineResult<TransactionReceipt> {
        let items = self.db.items();
        let ledger = self.db.transactions();

        let mut total = Money::zero();
        let mut recorded = Vec::with_capacity(requests.len());

        for request in requests {
            let item = items
                .get_by_code(&request.item_code)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound {
                    code: request.item_code.clone(),
                })?;

            let taken = items
                .try_decrement_stock(&item.item_code, request.quantity)
                .await?;
            if !taken {
                return Err(CoreError::InsufficientStock {
                    code: item.item_code,
                    available: item.current_quantity,
                    requested: request.quantity,
                }
                .into());
            }
            applied.push((item.item_code.clone(), request.quantity));

            let line = LineItem {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction.id.clone(),
                item_code: item.item_code.clone(),
                quantity: request.quantity,
                unit_price_cents: item.price_cents,
                created_at: Utc::now(),
            };
            ledger.add_line(&line).await?;

            total += item.price().multiply_quantity(request.quantity);
            recorded.push(line);
        }

        ledger.update_total(&transaction.id, total.cents()).await?;

        Ok(TransactionReceipt {
            transaction: Transaction {
                total_cents: total.cents(),
                ..transaction.clone()
            },
            lines: recorded,
        })
    }

    /// Reverses a partially applied transaction: every taken quantity goes
    /// back to its item, then the transaction record (and, by cascade, its
    /// recorded lines) is deleted.
    async fn rollback(&self, transaction_id: &str, applied: &[(String, i64)]) -> EngineResult<()> {
        warn!(
            transaction_id = %transaction_id,
            restored_lines = applied.len(),
            "Rolling back partial transaction"
        );

        let items = self.db.items();
        for (code, quantity) in applied {
            items.restore_stock(code, *quantity).await?;
        }

        self.db.transactions().delete(transaction_id).await?;
        Ok(())
    }

    /// Compensates a completed transaction: restores every line's quantity
    /// to its item, then deletes the transaction with its lines.
    ///
    /// Not idempotent. Invoking it again for the same id fails with
    /// [`CoreError::TransactionNotFound`] - callers must not retry blindly.
    pub async fn undo_transaction(&self, transaction_id: &str) -> EngineResult<()> {
        let ledger = self.db.transactions();

        if ledger.get_by_id(transaction_id).await?.is_none() {
            return Err(CoreError::TransactionNotFound {
                id: transaction_id.to_string(),
            }
            .into());
        }

        let lines = ledger.get_lines(transaction_id).await?;
        let items = self.db.items();
        for line in &lines {
            items.restore_stock(&line.item_code, line.quantity).await?;
        }

        ledger.delete(transaction_id).await?;

        info!(transaction_id = %transaction_id, restored_lines = lines.len(), "Transaction undone");
        Ok(())
    }

    /// Fetches a transaction with its lines.
    pub async fn get_transaction(&self, transaction_id: &str) -> EngineResult<TransactionReceipt> {
        let ledger = self.db.transactions();

        let transaction = ledger.get_by_id(transaction_id).await?.ok_or_else(|| {
            CoreError::TransactionNotFound {
                id: transaction_id.to_string(),
            }
        })?;
        let lines = ledger.get_lines(transaction_id).await?;

        Ok(TransactionReceipt { transaction, lines })
    }

    /// Fetches a catalog item, for the surrounding service layer's item
    /// details endpoint.
    pub async fn get_item(&self, code: &str) -> EngineResult<Item> {
        self.db
            .items()
            .get_by_code(code)
            .await?
            .ok_or_else(|| {
                CoreError::ItemNotFound {
                    code: code.to_string(),
                }
                .into()
            })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
