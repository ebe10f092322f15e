//! Translation store metrics.
//!
//! Counters for cache effectiveness and write volume, owned by a
//! [`TranslationStore`](crate::store::TranslationStore).

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct StoreMetrics {
    /// Row lookups answered from the cache
    cache_hits: AtomicUsize,

    /// Row lookups that had to go to the database
    cache_misses: AtomicUsize,

    /// Rows inserted
    rows_created: AtomicUsize,

    /// Rows updated in place
    rows_updated: AtomicUsize,

    /// Logical ids taken from the counter
    ids_allocated: AtomicUsize,
}

impl StoreMetrics {
    /// Record a row lookup answered from the cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a row lookup that went to the database.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inserted translation row.
    pub fn record_row_created(&self) {
        self.rows_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a translation row updated in place.
    pub fn record_row_updated(&self) {
        self.rows_updated.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a logical id taken from the counter.
    pub fn record_id_allocated(&self) {
        self.ids_allocated.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total cache hits.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get total cache misses.
    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Get total rows created.
    pub fn rows_created(&self) -> usize {
        self.rows_created.load(Ordering::Relaxed)
    }

    /// Get total rows updated.
    pub fn rows_updated(&self) -> usize {
        self.rows_updated.load(Ordering::Relaxed)
    }

    /// Get total logical ids allocated.
    pub fn ids_allocated(&self) -> usize {
        self.ids_allocated.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            rows_created: self.rows_created(),
            rows_updated: self.rows_updated(),
            ids_allocated: self.ids_allocated(),
        }
    }
}

/// Point-in-time snapshot of [`StoreMetrics`].
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub cache_hits: usize,
    pub cache_misses: usize,
    /// Percentage of lookups served from cache (0-100)
    pub cache_hit_rate: f64,
    pub rows_created: usize,
    pub rows_updated: usize,
    pub ids_allocated: usize,
}

impl MetricsReport {
    /// Format the report as a one-line log string.
    pub fn format(&self) -> String {
        format!(
            "cache {}/{} hits ({:.1}%), {} rows created, {} rows updated, {} ids allocated",
            self.cache_hits,
            self.cache_hits + self.cache_misses,
            self.cache_hit_rate,
            self.rows_created,
            self.rows_updated,
            self.ids_allocated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_metrics_are_zero() {
        let metrics = StoreMetrics::default();
        let report = metrics.report();
        assert_eq!(report.cache_hits, 0);
        assert_eq!(report.cache_misses, 0);
        assert_eq!(report.cache_hit_rate, 0.0);
        assert_eq!(report.rows_created, 0);
    }

    #[test]
    fn test_cache_hit_rate() {
        let metrics = StoreMetrics::default();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let report = metrics.report();
        assert_eq!(report.cache_hit_rate, 75.0);
    }

    #[test]
    fn test_write_counters() {
        let metrics = StoreMetrics::default();
        metrics.record_id_allocated();
        metrics.record_row_created();
        metrics.record_row_created();
        metrics.record_row_updated();

        assert_eq!(metrics.ids_allocated(), 1);
        assert_eq!(metrics.rows_created(), 2);
        assert_eq!(metrics.rows_updated(), 1);
    }

    #[test]
    fn test_report_format() {
        let metrics = StoreMetrics::default();
        metrics.record_cache_hit();
        metrics.record_cache_miss();

        let line = metrics.report().format();
        assert!(line.contains("cache 1/2 hits (50.0%)"));
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(StoreMetrics::default().report()).unwrap();
        assert_eq!(json["rows_updated"], 0);
    }
}
