//! Atomic counters for catalog and enrichment activity.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe atomic counter.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Counters owned by a catalog cache.
#[derive(Debug, Default)]
pub struct CatalogMetrics {
    /// Upstream fetch rounds started.
    pub refreshes: Counter,
    /// Rounds that published a new snapshot.
    pub published: Counter,
    /// Rounds that fell back to last-known-good.
    pub degraded: Counter,
    /// Individual provider listing failures.
    pub provider_failures: Counter,
}

impl CatalogMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CatalogMetricsSnapshot {
        CatalogMetricsSnapshot {
            refreshes: self.refreshes.get(),
            published: self.published.get(),
            degraded: self.degraded.get(),
            provider_failures: self.provider_failures.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogMetricsSnapshot {
    pub refreshes: u64,
    pub published: u64,
    pub degraded: u64,
    pub provider_failures: u64,
}

/// Counters owned by an enrichment client.
#[derive(Debug, Default)]
pub struct EnrichmentMetrics {
    /// Outbound feed requests.
    pub fetches: Counter,
    /// Requests that failed or returned no records.
    pub failures: Counter,
}

impl EnrichmentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> EnrichmentMetricsSnapshot {
        EnrichmentMetricsSnapshot {
            fetches: self.fetches.get(),
            failures: self.failures.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentMetricsSnapshot {
    pub fetches: u64,
    pub failures: u64,
}
