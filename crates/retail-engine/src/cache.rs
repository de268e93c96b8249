//! # Result Cache
//!
//! Short-lived memoization in front of the expensive analytics reports.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Result Cache                                     │
//! │                                                                         │
//! │  caller ──► CachedAnalytics::range_average(start, end)                 │
//! │                  │                                                      │
//! │                  ├── key = "range_average:2024-09-01:2024-09-16"       │
//! │                  │                                                      │
//! │                  ├── ResultCache.get(key) ── live entry? ──► return it │
//! │                  │                                                      │
//! │                  └── miss/expired:                                     │
//! │                      AnalyticsEngine computes ──► put(key, ttl) ──►    │
//! │                      return fresh value                                │
//! │                                                                         │
//! │  periodic job ──► refresh_daily_summary(today)   (recompute + store,   │
//! │                   unconditionally - the idempotent warm-up entry)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each wrapped operation states its TTL explicitly through [`CachePolicy`];
//! there is no ambient default. Keys are derived deterministically from the
//! operation name and its date parameters, so equal queries share an entry.
//!
//! Values are stored as JSON. The reports are plain serde types, and JSON
//! keeps the cache agnostic of which report it is holding - the same trick
//! the wire layer plays.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::analytics::AnalyticsEngine;
use crate::error::EngineResult;
use retail_core::analytics::{DailySummary, RangeAverages, SalesComparison, SalesDetail};

// =============================================================================
// Cache Store
// =============================================================================

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// A time-bounded key-value store for memoized report values.
///
/// Concurrent readers and writers share the map behind a Mutex; every
/// operation holds the lock only long enough to touch its entry. Expired
/// entries are dropped opportunistically on read.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        ResultCache::default()
    }

    /// Returns the live value under `key`, evicting it first if it has
    /// expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().expect("Result cache mutex poisoned");

        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    pub fn put(&self, key: &str, value: Value, ttl: Duration) {
        let mut entries = self.entries.lock().expect("Result cache mutex poisoned");
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drops every expired entry. `get` already evicts lazily; this is for
    /// housekeeping on long-idle processes.
    pub fn purge_expired(&self) {
        let mut entries = self.entries.lock().expect("Result cache mutex poisoned");
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("Result cache mutex poisoned")
            .len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Cache Policy
// =============================================================================

/// Per-operation time-to-live configuration.
///
/// The daily summary changes all day and is refreshed out-of-band, so it
/// expires quickly; the ranged reports are historical and can sit for an
/// hour.
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    /// TTL for the daily summary. Default: 5 minutes.
    pub daily_summary_ttl: Duration,
    /// TTL for range average, sales detail and comparison. Default: 60
    /// minutes.
    pub report_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            daily_summary_ttl: Duration::from_secs(60 * 5),
            report_ttl: Duration::from_secs(60 * 60),
        }
    }
}

// =============================================================================
// Cache Keys
// =============================================================================

fn daily_summary_key(date: NaiveDate) -> String {
    format!("daily_summary:{date}")
}

fn range_average_key(start: NaiveDate, end: NaiveDate) -> String {
    format!("range_average:{start}:{end}")
}

fn sales_detail_key(start: NaiveDate, end: NaiveDate) -> String {
    format!("sales_detail:{start}:{end}")
}

fn comparison_key(first: (NaiveDate, NaiveDate), second: (NaiveDate, NaiveDate)) -> String {
    format!(
        "compare_ranges:{}:{}:{}:{}",
        first.0, first.1, second.0, second.1
    )
}

// =============================================================================
// Cached Analytics
// =============================================================================

/// The analytics engine wrapped with per-operation memoization.
///
/// Item trend and range totals pass through uncached: the trend report is
/// cheap relative to its staleness cost, and totals only back the
/// comparison report, which is cached as a whole.
#[derive(Debug)]
pub struct CachedAnalytics {
    analytics: AnalyticsEngine,
    cache: ResultCache,
    policy: CachePolicy,
}

impl CachedAnalytics {
    /// Wraps an analytics engine with the given policy.
    pub fn new(analytics: AnalyticsEngine, policy: CachePolicy) -> Self {
        CachedAnalytics {
            analytics,
            cache: ResultCache::new(),
            policy,
        }
    }

    /// The underlying store, for diagnostics and housekeeping.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Daily summary, memoized for [`CachePolicy::daily_summary_ttl`].
    pub async fn daily_summary(&self, date: NaiveDate) -> EngineResult<DailySummary> {
        let key = daily_summary_key(date);
        if let Some(hit) = self.lookup::<DailySummary>(&key) {
            return Ok(hit);
        }

        let fresh = self.analytics.daily_summary(date).await?;
        self.store(&key, &fresh, self.policy.daily_summary_ttl)?;
        Ok(fresh)
    }

    /// Range averages, memoized for [`CachePolicy::report_ttl`].
    pub async fn range_average(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<RangeAverages> {
        let key = range_average_key(start, end);
        if let Some(hit) = self.lookup::<RangeAverages>(&key) {
            return Ok(hit);
        }

        let fresh = self.analytics.range_average(start, end).await?;
        self.store(&key, &fresh, self.policy.report_ttl)?;
        Ok(fresh)
    }

    /// Sales detail, memoized for [`CachePolicy::report_ttl`].
    pub async fn sales_detail(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<SalesDetail> {
        let key = sales_detail_key(start, end);
        if let Some(hit) = self.lookup::<SalesDetail>(&key) {
            return Ok(hit);
        }

        let fresh = self.analytics.sales_detail(start, end).await?;
        self.store(&key, &fresh, self.policy.report_ttl)?;
        Ok(fresh)
    }

    /// Range comparison, memoized for [`CachePolicy::report_ttl`].
    pub async fn compare_ranges(
        &self,
        first: (NaiveDate, NaiveDate),
        second: (NaiveDate, NaiveDate),
    ) -> EngineResult<SalesComparison> {
        let key = comparison_key(first, second);
        if let Some(hit) = self.lookup::<SalesComparison>(&key) {
            return Ok(hit);
        }

        let fresh = self.analytics.compare_ranges(first, second).await?;
        self.store(&key, &fresh, self.policy.report_ttl)?;
        Ok(fresh)
    }

    /// Recomputes the daily summary and stores it unconditionally,
    /// returning the fresh value.
    ///
    /// This is the warm-up entry point for the external periodic scheduler:
    /// idempotent, and never served from the cache itself.
    pub async fn refresh_daily_summary(&self, date: NaiveDate) -> EngineResult<DailySummary> {
        debug!(date = %date, "Refreshing daily summary cache entry");

        let fresh = self.analytics.daily_summary(date).await?;
        self.store(
            &daily_summary_key(date),
            &fresh,
            self.policy.daily_summary_ttl,
        )?;
        Ok(fresh)
    }

    fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(hit) => {
                debug!(key = %key, "Result cache hit");
                Some(hit)
            }
            // A shape mismatch means the entry predates a report change;
            // treat it as a miss and let the fresh value overwrite it.
            Err(_) => None,
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> EngineResult<()> {
        self.cache.put(key, serde_json::to_value(value)?, ttl);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, P001};
    use crate::transaction::TransactionEngine;
    use retail_core::LineRequest;
    use serde_json::json;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    // -------------------------------------------------------------------------
    // ResultCache
    // -------------------------------------------------------------------------

    #[test]
    fn test_cache_put_get() {
        let cache = ResultCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("missing").is_none());

        cache.put("k", json!({"total": 42}), Duration::from_secs(60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").unwrap()["total"], 42);
    }

    #[test]
    fn test_cache_expiry_evicts_on_read() {
        let cache = ResultCache::new();
        cache.put("k", json!(1), Duration::from_secs(0));

        assert!(cache.get("k").is_none());
        assert!(cache.is_empty()); // evicted, not just hidden
    }

    #[test]
    fn test_cache_purge_expired() {
        let cache = ResultCache::new();
        cache.put("dead", json!(1), Duration::from_secs(0));
        cache.put("live", json!(2), Duration::from_secs(60));

        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("live").is_some());
    }

    #[test]
    fn test_cache_overwrite_replaces_entry() {
        let cache = ResultCache::new();
        cache.put("k", json!(1), Duration::from_secs(60));
        cache.put("k", json!(2), Duration::from_secs(60));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k").unwrap(), json!(2));
    }

    // -------------------------------------------------------------------------
    // CachedAnalytics
    // -------------------------------------------------------------------------

    async fn cached_analytics() -> (retail_db::Database, TransactionEngine, CachedAnalytics) {
        let db = seeded_db().await;
        let engine = TransactionEngine::new(db.clone());
        engine
            .create_transaction_on(date(1), &[LineRequest::new(P001, 2)])
            .await
            .unwrap();

        let cached = CachedAnalytics::new(AnalyticsEngine::new(db.clone()), CachePolicy::default());
        (db, engine, cached)
    }

    #[tokio::test]
    async fn test_miss_computes_and_stores() {
        let (_db, _engine, cached) = cached_analytics().await;

        assert!(cached.cache().is_empty());
        let summary = cached.daily_summary(date(1)).await.unwrap();
        assert_eq!(summary.total_sales_cents, 2000);
        assert_eq!(cached.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_hit_short_circuits_recomputation() {
        let (_db, engine, cached) = cached_analytics().await;

        let before = cached.daily_summary(date(1)).await.unwrap();

        // New ledger activity inside the TTL window is invisible...
        engine
            .create_transaction_on(date(1), &[LineRequest::new(P001, 1)])
            .await
            .unwrap();
        let hit = cached.daily_summary(date(1)).await.unwrap();
        assert_eq!(hit.total_sales_cents, before.total_sales_cents);

        // ...until the warm-up entry point recomputes unconditionally.
        let refreshed = cached.refresh_daily_summary(date(1)).await.unwrap();
        assert_eq!(refreshed.total_sales_cents, 3000);

        let after = cached.daily_summary(date(1)).await.unwrap();
        assert_eq!(after.total_sales_cents, 3000);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputes() {
        let db = seeded_db().await;
        let engine = TransactionEngine::new(db.clone());
        engine
            .create_transaction_on(date(1), &[LineRequest::new(P001, 2)])
            .await
            .unwrap();

        // Zero TTL: every read is a miss.
        let policy = CachePolicy {
            daily_summary_ttl: Duration::from_secs(0),
            report_ttl: Duration::from_secs(0),
        };
        let cached = CachedAnalytics::new(AnalyticsEngine::new(db.clone()), policy);

        cached.daily_summary(date(1)).await.unwrap();
        engine
            .create_transaction_on(date(1), &[LineRequest::new(P001, 1)])
            .await
            .unwrap();

        let fresh = cached.daily_summary(date(1)).await.unwrap();
        assert_eq!(fresh.total_sales_cents, 3000);
    }

    #[tokio::test]
    async fn test_distinct_parameters_get_distinct_entries() {
        let (_db, _engine, cached) = cached_analytics().await;

        cached.range_average(date(1), date(2)).await.unwrap();
        cached.range_average(date(1), date(3)).await.unwrap();
        cached.sales_detail(date(1), date(2)).await.unwrap();
        cached
            .compare_ranges((date(1), date(2)), (date(3), date(4)))
            .await
            .unwrap();

        assert_eq!(cached.cache().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_range_not_cached() {
        let (_db, _engine, cached) = cached_analytics().await;

        assert!(cached.range_average(date(3), date(1)).await.is_err());
        assert!(cached.cache().is_empty());
    }
}
