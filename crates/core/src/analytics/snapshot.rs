//! Analytics snapshots and the range-keyed snapshot cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use buildtrack_shared::AppResult;
use buildtrack_shared::config::AnalyticsConfig;

use crate::model::{Expense, ExtensionRequest, Phase, PhaseChange, Project};

use super::filter::DateRange;

/// Everything loaded for one project: the project document plus its
/// sub-collections.
#[derive(Debug, Clone, Default)]
pub struct ProjectData {
    /// Phases, in sequence order.
    pub phases: Vec<Phase>,
    /// All expenses of the project, regardless of the filter's date range.
    /// Burn rate looks at a trailing wall-clock window that may fall
    /// outside the range, so the loader must not pre-filter by date.
    pub expenses: Vec<Expense>,
    /// Extension requests across the project's phases.
    pub extensions: Vec<ExtensionRequest>,
    /// Append-only extension change log.
    pub changes: Vec<PhaseChange>,
}

/// One immutable snapshot of the data the aggregation reads.
#[derive(Debug, Clone)]
pub struct AnalyticsSnapshot {
    /// Range the snapshot was loaded for.
    pub range: DateRange,
    /// Projects with their sub-collections, in load order.
    pub projects: Vec<(Project, ProjectData)>,
}

/// Source of snapshots; implemented by the store layer.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Loads a fresh snapshot covering `range`.
    async fn load(&self, range: DateRange) -> AppResult<AnalyticsSnapshot>;
}

/// TTL cache of snapshots keyed by date range.
///
/// A recompute with an unchanged range reuses the cached snapshot; only a
/// range change (or an explicit invalidation after a write) reloads.
pub struct SnapshotCache {
    cache: moka::sync::Cache<String, Arc<AnalyticsSnapshot>>,
}

impl SnapshotCache {
    /// Builds the cache from analytics settings.
    #[must_use]
    pub fn new(config: &AnalyticsConfig) -> Self {
        let cache = moka::sync::Cache::builder()
            .max_capacity(config.snapshot_capacity)
            .time_to_live(Duration::from_secs(config.snapshot_ttl_secs))
            .build();
        Self { cache }
    }

    /// Returns the cached snapshot for `range`, loading through `provider`
    /// on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the provider's load error; nothing is cached on failure.
    pub async fn get_or_load(
        &self,
        provider: &dyn SnapshotProvider,
        range: DateRange,
    ) -> AppResult<Arc<AnalyticsSnapshot>> {
        let key = range.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let snapshot = Arc::new(provider.load(range).await?);
        self.cache.insert(key, Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drops every cached snapshot. Called after writes that change the
    /// underlying data.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use super::*;

    struct CountingProvider {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotProvider for CountingProvider {
        async fn load(&self, range: DateRange) -> AppResult<AnalyticsSnapshot> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(AnalyticsSnapshot {
                range,
                projects: Vec::new(),
            })
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn test_same_range_hits_cache_and_new_range_reloads() {
        let provider = CountingProvider {
            loads: AtomicUsize::new(0),
        };
        let cache = SnapshotCache::new(&AnalyticsConfig::default());
        let r1 = DateRange::new(d(2026, 1, 1), d(2026, 6, 30));
        let r2 = DateRange::new(d(2026, 2, 1), d(2026, 6, 30));

        cache.get_or_load(&provider, r1).await.unwrap();
        cache.get_or_load(&provider, r1).await.unwrap();
        assert_eq!(provider.loads.load(Ordering::SeqCst), 1);

        cache.get_or_load(&provider, r2).await.unwrap();
        assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_all_forces_reload() {
        let provider = CountingProvider {
            loads: AtomicUsize::new(0),
        };
        let cache = SnapshotCache::new(&AnalyticsConfig::default());
        let range = DateRange::new(d(2026, 1, 1), d(2026, 6, 30));

        cache.get_or_load(&provider, range).await.unwrap();
        cache.invalidate_all();
        cache.get_or_load(&provider, range).await.unwrap();
        assert_eq!(provider.loads.load(Ordering::SeqCst), 2);
    }
}
