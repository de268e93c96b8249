//! # Analytics Aggregation Passes
//!
//! Pure read-side computations over ledger row sets. Nothing here mutates
//! anything or performs I/O: the repositories hand over flat, range-filtered
//! rows and each pass applies an explicit group-by with its aggregate and
//! sort order.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Analytics Data Flow                                │
//! │                                                                         │
//! │  ledger repository                                                     │
//! │  ├── transactions in range ──► &[Transaction]  (per-sale totals)       │
//! │  └── sold lines in range ────► &[SoldLineRow]  (line ⋈ date ⋈ item)    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  this module: group-by + sum/average, BTreeMap keyed so the sort       │
//! │  order of every report falls out of the grouping key                   │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  report types (serde) ──► result cache / service layer                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stored amounts stay integer cents; averages, moving averages and
//! percentage changes are f64 over cents because they are derived figures
//! that never flow back into the ledger.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{DateRange, SoldLineRow, Transaction};

/// Trailing window width for the per-item revenue moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

// =============================================================================
// Daily Summary
// =============================================================================

/// Quantity sold for one group (an item name or a category label).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuantity {
    /// Group key: item name or category label.
    pub name: String,
    pub total_quantity_sold: i64,
}

/// Sales summary for a single calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Sum of all transaction totals dated that day. 0 when the day is empty.
    pub total_sales_cents: i64,
    /// Quantity sold per item name, sorted by name ascending.
    pub items_quantity: Vec<GroupQuantity>,
    /// Quantity sold per category, sorted by category ascending.
    pub categories_quantity: Vec<GroupQuantity>,
}

/// Computes the sales summary for one day.
///
/// `transactions` and `lines` must already be filtered to the day in
/// question; the pass itself only groups and sums.
pub fn daily_summary(
    date: NaiveDate,
    transactions: &[Transaction],
    lines: &[SoldLineRow],
) -> DailySummary {
    let total_sales_cents = transactions.iter().map(|t| t.total_cents).sum();

    DailySummary {
        date,
        total_sales_cents,
        items_quantity: quantity_by_key(lines, |row| row.item_name.clone()),
        categories_quantity: quantity_by_key(lines, |row| row.category.clone()),
    }
}

/// Group-by + sum(quantity). The BTreeMap key doubles as the ascending sort
/// order of the report.
fn quantity_by_key<F>(lines: &[SoldLineRow], key: F) -> Vec<GroupQuantity>
where
    F: Fn(&SoldLineRow) -> String,
{
    let mut groups: BTreeMap<String, i64> = BTreeMap::new();
    for row in lines {
        *groups.entry(key(row)).or_insert(0) += row.quantity;
    }

    groups
        .into_iter()
        .map(|(name, total_quantity_sold)| GroupQuantity {
            name,
            total_quantity_sold,
        })
        .collect()
}

// =============================================================================
// Range Averages
// =============================================================================

/// Per-group averages across line occurrences (unweighted by transaction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAverage {
    /// Group key: item name or category label.
    pub name: String,
    /// Mean quantity per line occurrence.
    pub avg_quantity_sold: f64,
    /// Mean line revenue (`quantity * unit_price`) per line occurrence,
    /// in cents.
    pub avg_sales_cents: f64,
}

/// Average sales figures over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeAverages {
    /// Mean transaction total in cents. 0 when the range is empty.
    pub avg_sale_cents: f64,
    /// Per item name, sorted by name ascending.
    pub items: Vec<GroupAverage>,
    /// Per category, sorted by category ascending.
    pub categories: Vec<GroupAverage>,
}

/// Computes average transaction total plus per-item and per-category
/// averages for a range.
pub fn range_average(transactions: &[Transaction], lines: &[SoldLineRow]) -> RangeAverages {
    let avg_sale_cents = if transactions.is_empty() {
        0.0
    } else {
        let total: i64 = transactions.iter().map(|t| t.total_cents).sum();
        total as f64 / transactions.len() as f64
    };

    RangeAverages {
        avg_sale_cents,
        items: average_by_key(lines, |row| row.item_name.clone()),
        categories: average_by_key(lines, |row| row.category.clone()),
    }
}

/// Group-by + avg(quantity), avg(quantity * unit_price). Averages are taken
/// across line occurrences, not weighted by transaction.
fn average_by_key<F>(lines: &[SoldLineRow], key: F) -> Vec<GroupAverage>
where
    F: Fn(&SoldLineRow) -> String,
{
    // (occurrence count, quantity sum, revenue sum)
    let mut groups: BTreeMap<String, (i64, i64, i64)> = BTreeMap::new();
    for row in lines {
        let entry = groups.entry(key(row)).or_insert((0, 0, 0));
        entry.0 += 1;
        entry.1 += row.quantity;
        entry.2 += row.revenue_cents();
    }

    groups
        .into_iter()
        .map(|(name, (count, quantity, revenue))| GroupAverage {
            name,
            avg_quantity_sold: quantity as f64 / count as f64,
            avg_sales_cents: revenue as f64 / count as f64,
        })
        .collect()
}

// =============================================================================
// Sales Detail
// =============================================================================

/// One (date, item, category) combination with its summed figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesDetailRow {
    pub transaction_date: NaiveDate,
    pub item_name: String,
    pub category: String,
    pub total_quantity_sold: i64,
    pub total_sales_cents: i64,
}

/// Range-wide sales detail: scalar totals plus the per-combination rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesDetail {
    /// Sum of transaction totals across the range. 0 when empty.
    pub total_sales_cents: i64,
    /// Mean transaction total across the range. 0.0 when empty.
    pub avg_sale_cents: f64,
    /// Rows per (date, item, category), ordered by transaction date
    /// ascending.
    pub rows: Vec<SalesDetailRow>,
}

/// Computes the detailed sales report for a range.
pub fn sales_detail(transactions: &[Transaction], lines: &[SoldLineRow]) -> SalesDetail {
    let total_sales_cents: i64 = transactions.iter().map(|t| t.total_cents).sum();
    let avg_sale_cents = if transactions.is_empty() {
        0.0
    } else {
        total_sales_cents as f64 / transactions.len() as f64
    };

    // Keyed (date, item, category): iteration order gives the
    // date-ascending contract, with a stable item/category tiebreak.
    let mut groups: BTreeMap<(NaiveDate, String, String), (i64, i64)> = BTreeMap::new();
    for row in lines {
        let entry = groups
            .entry((
                row.transaction_date,
                row.item_name.clone(),
                row.category.clone(),
            ))
            .or_insert((0, 0));
        entry.0 += row.quantity;
        entry.1 += row.revenue_cents();
    }

    let rows = groups
        .into_iter()
        .map(
            |((transaction_date, item_name, category), (quantity, revenue))| SalesDetailRow {
                transaction_date,
                item_name,
                category,
                total_quantity_sold: quantity,
                total_sales_cents: revenue,
            },
        )
        .collect();

    SalesDetail {
        total_sales_cents,
        avg_sale_cents,
        rows,
    }
}

// =============================================================================
// Item Trend
// =============================================================================

/// Direction of the day-over-day revenue change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    /// No change, or the first data point of an item's series.
    #[serde(rename = "-")]
    Flat,
}

impl TrendDirection {
    fn from_change(change_cents: i64) -> Self {
        match change_cents {
            c if c > 0 => TrendDirection::Increasing,
            c if c < 0 => TrendDirection::Decreasing,
            _ => TrendDirection::Flat,
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "Increasing"),
            TrendDirection::Decreasing => write!(f, "Decreasing"),
            TrendDirection::Flat => write!(f, "-"),
        }
    }
}

/// One day of one item's sales series, with its rolling statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    pub transaction_date: NaiveDate,
    pub item_name: String,
    pub category: String,
    pub total_quantity_sold: i64,
    pub total_sales_cents: i64,
    /// Trailing mean revenue over up to [`MOVING_AVERAGE_WINDOW`] rows of
    /// this item's series, current row included. The first row of a series
    /// averages only itself.
    pub moving_avg_sales_cents: f64,
    /// Revenue delta against the previous row of this item's series.
    /// 0 on the first row.
    pub sales_change_cents: i64,
    pub trend: TrendDirection,
}

/// Computes the day-by-day trend series for every item sold in the range.
///
/// Rows are grouped by (item, date, category) and summed, ordered by item
/// name ascending then date ascending; the moving average and the
/// day-over-day delta are computed independently per item series. Returns
/// `None` when no line matched the range, so callers can report "no data"
/// explicitly instead of handing out empty aggregates.
pub fn item_trend(lines: &[SoldLineRow]) -> Option<Vec<TrendRow>> {
    if lines.is_empty() {
        return None;
    }

    // Keyed (item, date, category): iteration walks each item's series in
    // chronological order, one item after another.
    let mut groups: BTreeMap<(String, NaiveDate, String), (i64, i64)> = BTreeMap::new();
    for row in lines {
        let entry = groups
            .entry((
                row.item_name.clone(),
                row.transaction_date,
                row.category.clone(),
            ))
            .or_insert((0, 0));
        entry.0 += row.quantity;
        entry.1 += row.revenue_cents();
    }

    let mut rows = Vec::with_capacity(groups.len());
    let mut current_item: Option<String> = None;
    let mut window: VecDeque<i64> = VecDeque::with_capacity(MOVING_AVERAGE_WINDOW);
    let mut previous_revenue: Option<i64> = None;

    for ((item_name, date, category), (quantity, revenue)) in groups {
        // New item: its series starts fresh.
        if current_item.as_deref() != Some(item_name.as_str()) {
            current_item = Some(item_name.clone());
            window.clear();
            previous_revenue = None;
        }

        if window.len() == MOVING_AVERAGE_WINDOW {
            window.pop_front();
        }
        window.push_back(revenue);
        let moving_avg_sales_cents =
            window.iter().sum::<i64>() as f64 / window.len() as f64;

        let sales_change_cents = previous_revenue.map_or(0, |prev| revenue - prev);
        previous_revenue = Some(revenue);

        rows.push(TrendRow {
            transaction_date: date,
            item_name,
            category,
            total_quantity_sold: quantity,
            total_sales_cents: revenue,
            moving_avg_sales_cents,
            sales_change_cents,
            trend: TrendDirection::from_change(sales_change_cents),
        });
    }

    Some(rows)
}

// =============================================================================
// Range Totals & Comparison
// =============================================================================

/// Scalar totals over a range: the primitive behind range comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeTotals {
    /// Sum of `quantity * unit_price` over every line in range. 0 when
    /// empty.
    pub total_sales_cents: i64,
    /// Sum of quantities over every line in range. 0 when empty.
    pub total_quantity_sold: i64,
}

/// Computes total sales amount and total quantity sold over a row set.
pub fn range_totals(lines: &[SoldLineRow]) -> RangeTotals {
    RangeTotals {
        total_sales_cents: lines.iter().map(SoldLineRow::revenue_cents).sum(),
        total_quantity_sold: lines.iter().map(|row| row.quantity).sum(),
    }
}

/// One range's side of a comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangePerformance {
    pub range: DateRange,
    pub total_sales_cents: i64,
    pub total_quantity_sold: i64,
    /// `total_sales / inclusive day count`, in cents per day.
    pub avg_daily_sales_cents: f64,
}

impl RangePerformance {
    /// Builds the per-range block from its totals. The day count divisor is
    /// the inclusive calendar span, never zero by construction of
    /// [`DateRange`].
    pub fn new(range: DateRange, totals: RangeTotals) -> Self {
        RangePerformance {
            range,
            total_sales_cents: totals.total_sales_cents,
            total_quantity_sold: totals.total_quantity_sold,
            avg_daily_sales_cents: totals.total_sales_cents as f64 / range.day_count() as f64,
        }
    }
}

/// Side-by-side comparison of two date ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesComparison {
    pub first: RangePerformance,
    pub second: RangePerformance,
    /// `first - second`, in cents.
    pub sales_difference_cents: i64,
    /// `first - second`, in units.
    pub quantity_difference: i64,
    /// `(first - second) / second * 100`; 0 when the second range sold
    /// nothing.
    pub percentage_change_sales: f64,
    /// Same rule over quantities.
    pub percentage_change_quantity: f64,
}

/// Compares two ranges' totals, guarding the percentage denominators.
pub fn compare_ranges(first: RangePerformance, second: RangePerformance) -> SalesComparison {
    let sales_difference_cents = first.total_sales_cents - second.total_sales_cents;
    let quantity_difference = first.total_quantity_sold - second.total_quantity_sold;

    SalesComparison {
        percentage_change_sales: percentage_change(
            first.total_sales_cents,
            second.total_sales_cents,
        ),
        percentage_change_quantity: percentage_change(
            first.total_quantity_sold,
            second.total_quantity_sold,
        ),
        first,
        second,
        sales_difference_cents,
        quantity_difference,
    }
}

/// `(current - baseline) / baseline * 100`, with 0 when the baseline is 0.
fn percentage_change(current: i64, baseline: i64) -> f64 {
    if baseline == 0 {
        return 0.0;
    }
    (current - baseline) as f64 / baseline as f64 * 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================
