//! # Domain Types
//!
//! Core domain types for the catalog and the ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌─────────────────┐      │
//! │  │      Item       │   │   Transaction    │   │    LineItem     │      │
//! │  │  ─────────────  │   │  ──────────────  │   │  ─────────────  │      │
//! │  │  item_code (PK) │   │  id (UUID)       │   │  id (UUID)      │      │
//! │  │  name, category │   │  transaction_date│   │  transaction_id │      │
//! │  │  price_cents    │   │  created_at      │   │  item_code      │      │
//! │  │  starting_qty   │   │  total_cents     │   │  quantity       │      │
//! │  │  current_qty    │   └──────────────────┘   │  unit_price_cents│     │
//! │  └─────────────────┘                          └─────────────────┘      │
//! │                                                                         │
//! │  Transaction 1──N LineItem (composition: lines die with their owner)   │
//! │  LineItem    N──1 Item     (read-only reference by item_code)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line items snapshot the unit price at sale time; later catalog price
//! changes never rewrite ledger history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Item
// =============================================================================

/// A catalog item with its stock level.
///
/// `current_quantity` is the only mutable shared state in the system and is
/// mutated exclusively by the transaction engine (decrement on sale,
/// increment on rollback). `starting_quantity` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Business identifier, unique across the catalog.
    pub item_code: String,

    /// Display name.
    pub name: String,

    /// Category label used by the analytics groupings.
    pub category: String,

    /// Unit price in cents. Never negative.
    pub price_cents: i64,

    /// Stock level at creation time.
    pub starting_quantity: i64,

    /// Stock level right now. Never negative.
    pub current_quantity: i64,

    /// When the item was created.
    pub created_at: DateTime<Utc>,

    /// When the item was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be sold from current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.current_quantity >= quantity
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed sale recorded in the ledger.
///
/// `total_cents` equals the sum of `quantity * unit_price_cents` over its
/// line items once creation completes. `created_at` is set once and never
/// touched again; `transaction_date` is the calendar day the sale belongs
/// to (defaults to the creation day, backdatable for imports and tests).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    /// Generated unique identifier (UUID v4).
    pub id: String,

    /// Calendar day the sale is booked under.
    pub transaction_date: NaiveDate,

    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,

    /// Total bill amount in cents.
    pub total_cents: i64,
}

impl Transaction {
    /// Returns the total amount as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One item-quantity-price entry within a transaction.
///
/// Immutable after creation. `unit_price_cents` is a snapshot of the item's
/// price at sale time, deliberately decoupled from the catalog's current
/// price.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LineItem {
    /// Generated unique identifier (UUID v4).
    pub id: String,

    /// Owning transaction.
    pub transaction_id: String,

    /// Referenced catalog item.
    pub item_code: String,

    /// Units sold. Always positive.
    pub quantity: i64,

    /// Price snapshot at sale time, in cents.
    pub unit_price_cents: i64,

    /// When the line was recorded.
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line revenue: `quantity * unit_price`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Requests & Receipts
// =============================================================================

/// One requested line of a sale: which item, how many units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRequest {
    pub item_code: String,
    pub quantity: i64,
}

impl LineRequest {
    pub fn new(item_code: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            item_code: item_code.into(),
            quantity,
        }
    }
}

/// A persisted transaction together with its recorded lines, as returned to
/// the caller of `create_transaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction: Transaction,
    pub lines: Vec<LineItem>,
}

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive calendar date range.
///
/// Construction is the shared validation point for every range-based query:
/// a range with `start > end` cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a validated range, failing with `InvalidRange` when the
    /// start date is after the end date.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// Number of calendar days covered, both endpoints included.
    /// A single-day range counts as 1.
    #[inline]
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

// =============================================================================
// Analytics Input Row
// =============================================================================

/// A sold line joined with its transaction date and catalog labels: the flat
/// row set every aggregation pass consumes. Produced by the ledger
/// repository, filtered to a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SoldLineRow {
    /// Calendar day of the owning transaction.
    pub transaction_date: NaiveDate,

    /// Item display name at query time.
    pub item_name: String,

    /// Item category at query time.
    pub category: String,

    /// Units sold on this line.
    pub quantity: i64,

    /// Price snapshot of this line, in cents.
    pub unit_price_cents: i64,
}

impl SoldLineRow {
    /// Line revenue in cents: `quantity * unit_price`.
    #[inline]
    pub fn revenue_cents(&self) -> i64 {
        self.quantity * self.unit_price_cents
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_line_item_total() {
        let line = LineItem {
            id: "l1".to_string(),
            transaction_id: "t1".to_string(),
            item_code: "P001".to_string(),
            quantity: 3,
            unit_price_cents: 1050,
            created_at: Utc::now(),
        };
        assert_eq!(line.line_total().cents(), 3150);
    }

    #[test]
    fn test_item_can_sell() {
        let item = Item {
            item_code: "P001".to_string(),
            name: "Pizza".to_string(),
            category: "Food".to_string(),
            price_cents: 1000,
            starting_quantity: 100,
            current_quantity: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.can_sell(2));
        assert!(!item.can_sell(3));
    }

    #[test]
    fn test_date_range_validation() {
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).is_ok());
        assert!(DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).is_ok());

        let err = DateRange::new(date(2024, 1, 31), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidRange { .. }));
    }

    #[test]
    fn test_date_range_day_count() {
        let single = DateRange::new(date(2024, 1, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(single.day_count(), 1);

        let week = DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap();
        assert_eq!(week.day_count(), 7);
    }

    #[test]
    fn test_sold_line_revenue() {
        let row = SoldLineRow {
            transaction_date: date(2024, 9, 1),
            item_name: "Burger".to_string(),
            category: "Food".to_string(),
            quantity: 4,
            unit_price_cents: 550,
        };
        assert_eq!(row.revenue_cents(), 2200);
    }
}
