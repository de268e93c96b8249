//! # Analytics Engine
//!
//! Range-validated facade over the pure aggregation passes in
//! `retail_core::analytics`. Strictly read-side: every method fetches a
//! row set from the ledger and hands it to core; nothing here mutates the
//! catalog or the ledger.
//!
//! Range validation happens before any row is fetched, so an inverted range
//! costs one comparison, not a table scan.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::EngineResult;
use retail_core::analytics::{
    self, DailySummary, RangeAverages, RangePerformance, RangeTotals, SalesComparison,
    SalesDetail, TrendRow,
};
use retail_core::DateRange;
use retail_db::Database;

/// Read-side engine for sales reports.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    db: Database,
}

impl AnalyticsEngine {
    /// Creates a new engine over the given database.
    pub fn new(db: Database) -> Self {
        AnalyticsEngine { db }
    }

    /// Sales summary for one calendar day: total sales plus quantity sold
    /// per item and per category (groupings sorted by key ascending).
    pub async fn daily_summary(&self, date: NaiveDate) -> EngineResult<DailySummary> {
        debug!(date = %date, "Computing daily summary");

        let ledger = self.db.transactions();
        let transactions = ledger.in_range(date, date).await?;
        let lines = ledger.sold_lines_in_range(date, date).await?;

        Ok(analytics::daily_summary(date, &transactions, &lines))
    }

    /// Average transaction total plus per-item / per-category averages over
    /// an inclusive range.
    pub async fn range_average(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<RangeAverages> {
        let range = DateRange::new(start, end)?;
        debug!(start = %range.start, end = %range.end, "Computing range averages");

        let ledger = self.db.transactions();
        let transactions = ledger.in_range(range.start, range.end).await?;
        let lines = ledger.sold_lines_in_range(range.start, range.end).await?;

        Ok(analytics::range_average(&transactions, &lines))
    }

    /// Scalar totals plus (date, item, category) rows for the range, rows
    /// ordered by transaction date ascending.
    pub async fn sales_detail(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<SalesDetail> {
        let range = DateRange::new(start, end)?;
        debug!(start = %range.start, end = %range.end, "Computing sales detail");

        let ledger = self.db.transactions();
        let transactions = ledger.in_range(range.start, range.end).await?;
        let lines = ledger.sold_lines_in_range(range.start, range.end).await?;

        Ok(analytics::sales_detail(&transactions, &lines))
    }

    /// Per-item day-by-day series with moving average and day-over-day
    /// trend. `None` when no line matched the range.
    pub async fn item_trend(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Option<Vec<TrendRow>>> {
        let range = DateRange::new(start, end)?;
        debug!(start = %range.start, end = %range.end, "Computing item trend");

        let lines = self
            .db
            .transactions()
            .sold_lines_in_range(range.start, range.end)
            .await?;

        Ok(analytics::item_trend(&lines))
    }

    /// Total sales amount and total quantity sold over the range: the
    /// primitive behind [`AnalyticsEngine::compare_ranges`].
    pub async fn range_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<RangeTotals> {
        let range = DateRange::new(start, end)?;
        debug!(start = %range.start, end = %range.end, "Computing range totals");

        let lines = self
            .db
            .transactions()
            .sold_lines_in_range(range.start, range.end)
            .await?;

        Ok(analytics::range_totals(&lines))
    }

    /// Side-by-side comparison of two ranges. Both ranges are validated
    /// before either is aggregated.
    pub async fn compare_ranges(
        &self,
        first: (NaiveDate, NaiveDate),
        second: (NaiveDate, NaiveDate),
    ) -> EngineResult<SalesComparison> {
        let first_range = DateRange::new(first.0, first.1)?;
        let second_range = DateRange::new(second.0, second.1)?;
        debug!(
            first_start = %first_range.start, first_end = %first_range.end,
            second_start = %second_range.start, second_end = %second_range.end,
            "Comparing ranges"
        );

        let first_totals = self.range_totals(first_range.start, first_range.end).await?;
        let second_totals = self
            .range_totals(second_range.start, second_range.end)
            .await?;

        Ok(analytics::compare_ranges(
            RangePerformance::new(first_range, first_totals),
            RangePerformance::new(second_range, second_totals),
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::test_support::{seeded_db, P001, S001};
    use crate::transaction::TransactionEngine;
    use retail_core::{CoreError, LineRequest};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    /// Seeds a small ledger:
    ///   Sep 1: 2×Pizza ($20.00) and 3×Soda ($4.50)
    ///   Sep 2: 1×Pizza ($10.00)
    ///   Sep 3: 4×Burger ($20.00)
    async fn seeded_ledger() -> (retail_db::Database, AnalyticsEngine) {
        let db = seeded_db().await;
        let engine = TransactionEngine::new(db.clone());

        engine
            .create_transaction_on(date(1), &[LineRequest::new(P001, 2)])
            .await
            .unwrap();
        engine
            .create_transaction_on(date(1), &[LineRequest::new(S001, 3)])
            .await
            .unwrap();
        engine
            .create_transaction_on(date(2), &[LineRequest::new(P001, 1)])
            .await
            .unwrap();
        engine
            .create_transaction_on(date(3), &[LineRequest::new("B001", 4)])
            .await
            .unwrap();

        let analytics = AnalyticsEngine::new(db.clone());
        (db, analytics)
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let (_db, analytics) = seeded_ledger().await;

        let summary = analytics.daily_summary(date(1)).await.unwrap();
        // $20.00 + $4.50
        assert_eq!(summary.total_sales_cents, 2450);

        let names: Vec<&str> = summary
            .items_quantity
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, ["Pizza", "Soda"]);

        let categories: Vec<&str> = summary
            .categories_quantity
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(categories, ["Beverage", "Food"]);
    }

    #[tokio::test]
    async fn test_daily_summary_empty_day() {
        let (_db, analytics) = seeded_ledger().await;

        let summary = analytics.daily_summary(date(20)).await.unwrap();
        assert_eq!(summary.total_sales_cents, 0);
        assert!(summary.items_quantity.is_empty());
        assert!(summary.categories_quantity.is_empty());
    }

    #[tokio::test]
    async fn test_range_average() {
        let (_db, analytics) = seeded_ledger().await;

        let averages = analytics.range_average(date(1), date(3)).await.unwrap();
        // Transactions: 2000, 450, 1000, 2000 → mean 1362.5
        assert_eq!(averages.avg_sale_cents, 1362.5);

        let pizza = averages.items.iter().find(|g| g.name == "Pizza").unwrap();
        assert_eq!(pizza.avg_quantity_sold, 1.5);
        assert_eq!(pizza.avg_sales_cents, 1500.0);
    }

    #[tokio::test]
    async fn test_range_average_empty_range() {
        let (_db, analytics) = seeded_ledger().await;

        let averages = analytics.range_average(date(20), date(25)).await.unwrap();
        assert_eq!(averages.avg_sale_cents, 0.0);
        assert!(averages.items.is_empty());
        assert!(averages.categories.is_empty());
    }

    #[tokio::test]
    async fn test_sales_detail() {
        let (_db, analytics) = seeded_ledger().await;

        let detail = analytics.sales_detail(date(1), date(3)).await.unwrap();
        assert_eq!(detail.total_sales_cents, 5450);
        assert_eq!(detail.avg_sale_cents, 1362.5);

        // One row per (date, item, category), date ascending.
        assert_eq!(detail.rows.len(), 4);
        assert!(detail
            .rows
            .windows(2)
            .all(|w| w[0].transaction_date <= w[1].transaction_date));
    }

    #[tokio::test]
    async fn test_item_trend() {
        let (_db, analytics) = seeded_ledger().await;

        let rows = analytics.item_trend(date(1), date(3)).await.unwrap().unwrap();

        // Pizza sold on two days; its first point averages only itself.
        let pizza: Vec<_> = rows.iter().filter(|r| r.item_name == "Pizza").collect();
        assert_eq!(pizza.len(), 2);
        assert_eq!(pizza[0].moving_avg_sales_cents, 2000.0);
        assert_eq!(pizza[1].sales_change_cents, -1000);
    }

    #[tokio::test]
    async fn test_item_trend_no_data() {
        let (_db, analytics) = seeded_ledger().await;

        let report = analytics.item_trend(date(20), date(25)).await.unwrap();
        assert!(report.is_none());
    }

    #[tokio::test]
    async fn test_range_totals_and_comparison() {
        let (_db, analytics) = seeded_ledger().await;

        let totals = analytics.range_totals(date(1), date(2)).await.unwrap();
        assert_eq!(totals.total_sales_cents, 3450);
        assert_eq!(totals.total_quantity_sold, 6);

        let comparison = analytics
            .compare_ranges((date(1), date(2)), (date(3), date(4)))
            .await
            .unwrap();
        assert_eq!(comparison.first.total_sales_cents, 3450);
        assert_eq!(comparison.second.total_sales_cents, 2000);
        assert_eq!(comparison.sales_difference_cents, 1450);
        assert_eq!(comparison.percentage_change_sales, 72.5);
        // 2-day ranges: average daily sales is half the total.
        assert_eq!(comparison.first.avg_daily_sales_cents, 1725.0);
    }

    #[tokio::test]
    async fn test_comparison_against_empty_range_guards_division() {
        let (_db, analytics) = seeded_ledger().await;

        let comparison = analytics
            .compare_ranges((date(1), date(2)), (date(20), date(21)))
            .await
            .unwrap();
        assert_eq!(comparison.second.total_sales_cents, 0);
        assert_eq!(comparison.percentage_change_sales, 0.0);
        assert_eq!(comparison.percentage_change_quantity, 0.0);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected_everywhere() {
        let (_db, analytics) = seeded_ledger().await;

        let check = |err: EngineError| {
            assert!(matches!(
                err,
                EngineError::Core(CoreError::InvalidRange { .. })
            ));
        };

        check(analytics.range_average(date(3), date(1)).await.unwrap_err());
        check(analytics.sales_detail(date(3), date(1)).await.unwrap_err());
        check(analytics.item_trend(date(3), date(1)).await.unwrap_err());
        check(analytics.range_totals(date(3), date(1)).await.unwrap_err());
        check(
            analytics
                .compare_ranges((date(1), date(2)), (date(4), date(3)))
                .await
                .unwrap_err(),
        );
    }
}
