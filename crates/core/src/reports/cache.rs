//! Report result caching using Moka.
//!
//! Reports are keyed by a SHA-256 hash of their kind, period and filters and
//! kept for a short time-to-live. Writes to sessions, modules, schools and
//! trainers call `invalidate_all`.

use moka::sync::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

use super::period::ReportPeriod;
use super::types::{ActivityReport, ReportFilter};

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 200;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache for computed reports. Cloning shares the underlying store.
#[derive(Clone)]
pub struct ReportCache {
    cache: Cache<String, Arc<ActivityReport>>,
}

impl std::fmt::Debug for ReportCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl ReportCache {
    /// Creates a cache with default settings (200 entries, 5 minute TTL).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Hex SHA-256 of the report identity.
    #[must_use]
    pub fn cache_key(kind: &str, period: &ReportPeriod, filter: &ReportFilter) -> String {
        let fmt_id = |id: Option<String>| id.unwrap_or_else(|| "*".to_string());
        let identity = format!(
            "{kind}|{}|{}|{}|school={}|trainer={}|module={}",
            period.kind,
            period.start,
            period.end,
            fmt_id(filter.school_id.map(|id| id.to_string())),
            fmt_id(filter.trainer_id.map(|id| id.to_string())),
            fmt_id(filter.module_id.map(|id| id.to_string())),
        );

        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Stores a report computed elsewhere.
    pub fn insert(&self, key: &str, report: ActivityReport) {
        self.cache.insert(key.to_string(), Arc::new(report));
    }

    /// Cached report for `key`, if still fresh.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<ActivityReport> {
        self.cache.get(key).map(|hit| {
            let mut report = (*hit).clone();
            report.cached = true;
            report
        })
    }

    /// Invalidates all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance so counts and evictions are up to date.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::service::ReportService;
    use chrono::NaiveDate;
    use classplan_shared::types::SchoolId;
    use rust_decimal_macros::dec;

    fn period() -> ReportPeriod {
        ReportPeriod::week_containing(NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()).unwrap()
    }

    fn compute() -> ActivityReport {
        ReportService::summarize(period(), ReportFilter::default(), &[], dec!(50))
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let cache = ReportCache::new();
        let key = ReportCache::cache_key("activity", &period(), &ReportFilter::default());
        assert!(cache.get(&key).is_none());

        let fresh = compute();
        assert!(!fresh.cached);
        cache.insert(&key, fresh);

        let hit = cache.get(&key).unwrap();
        assert!(hit.cached);
    }

    #[test]
    fn test_key_depends_on_filters() {
        let all = ReportCache::cache_key("activity", &period(), &ReportFilter::default());
        let one_school = ReportCache::cache_key(
            "activity",
            &period(),
            &ReportFilter {
                school_id: Some(SchoolId::new()),
                ..ReportFilter::default()
            },
        );
        assert_ne!(all, one_school);
        assert_eq!(all.len(), 64);
        assert_eq!(
            all,
            ReportCache::cache_key("activity", &period(), &ReportFilter::default())
        );
    }

    #[test]
    fn test_invalidate_all() {
        let cache = ReportCache::new();
        let key = ReportCache::cache_key("activity", &period(), &ReportFilter::default());
        cache.insert(&key, compute());
        assert!(cache.get(&key).is_some());

        cache.invalidate_all();
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_entry_count() {
        let cache = ReportCache::with_config(10, 60);
        cache.insert("a", compute());
        cache.insert("b", compute());
        cache.run_pending_tasks();
        assert_eq!(cache.entry_count(), 2);
    }
}
