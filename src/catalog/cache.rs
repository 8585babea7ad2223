//! Process-lifetime catalog cache with last-known-good fallback.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::fetcher::CatalogFetcher;
use super::merge::{apply_enrichment, merge_outcomes};
use super::snapshot::CatalogSnapshot;
use crate::config::{CatalogConfig, expiry_after};
use crate::enrichment::{EnrichmentSource, NoEnrichment};
use crate::observability::{CatalogMetrics, CatalogMetricsSnapshot};
use crate::providers::ProviderRegistry;
use crate::{Error, Result};

/// Externally visible state of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// No snapshot has ever been published.
    Empty,
    /// Serving a snapshot inside its TTL.
    Fresh,
    /// Serving an expired snapshot; the next read refreshes.
    Stale,
    /// Serving last-known-good after a round where every provider failed.
    Degraded,
}

#[derive(Default)]
struct CacheState {
    current: Option<Arc<CatalogSnapshot>>,
    expires_at: Option<Instant>,
    last_known_good: Option<Arc<CatalogSnapshot>>,
    degraded: bool,
    generation: u64,
}

impl CacheState {
    fn fresh(&self, now: Instant) -> Option<Arc<CatalogSnapshot>> {
        match (&self.current, self.expires_at) {
            (Some(current), Some(expires_at)) if now < expires_at => Some(Arc::clone(current)),
            _ => None,
        }
    }
}

/// Owns the merged catalog snapshot and refreshes it on demand.
///
/// Reads take a short state lock only to clone an `Arc`. Refreshes are
/// serialized by a separate async mutex and re-check staleness after
/// acquiring it, so concurrent cold readers share one upstream round.
pub struct CatalogCache {
    fetcher: CatalogFetcher,
    enrichment: Arc<dyn EnrichmentSource>,
    config: CatalogConfig,
    state: RwLock<CacheState>,
    refresh: Mutex<()>,
    metrics: CatalogMetrics,
}

impl CatalogCache {
    pub fn new(
        registry: ProviderRegistry,
        enrichment: Arc<dyn EnrichmentSource>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            fetcher: CatalogFetcher::new(registry),
            enrichment,
            config,
            state: RwLock::new(CacheState::default()),
            refresh: Mutex::new(()),
            metrics: CatalogMetrics::new(),
        }
    }

    /// Cache without an enrichment feed.
    pub fn without_enrichment(registry: ProviderRegistry, config: CatalogConfig) -> Self {
        Self::new(registry, Arc::new(NoEnrichment), config)
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.fetcher.registry()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn metrics(&self) -> CatalogMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Currently published snapshot, fresh or not.
    pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.read_state().current.clone()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.read_state().expires_at
    }

    /// Incremented on every publish or degrade.
    pub fn generation(&self) -> u64 {
        self.read_state().generation
    }

    pub fn status(&self) -> CacheStatus {
        let state = self.read_state();
        match (&state.current, state.expires_at) {
            (None, _) => CacheStatus::Empty,
            (Some(_), Some(expires_at)) if Instant::now() < expires_at => {
                if state.degraded {
                    CacheStatus::Degraded
                } else {
                    CacheStatus::Fresh
                }
            }
            (Some(_), _) => CacheStatus::Stale,
        }
    }

    /// Expire the current snapshot. It stays readable and remains the
    /// fallback; the next [`ensure_loaded`](Self::ensure_loaded) refreshes.
    pub fn invalidate(&self) {
        let mut state = self.write_state();
        state.expires_at = None;
    }

    /// Return a usable snapshot, refreshing it first if it has expired.
    ///
    /// Fails only when cancelled, or when no snapshot has ever been built
    /// and no provider returned any model.
    pub async fn ensure_loaded(&self, cancel: &CancellationToken) -> Result<Arc<CatalogSnapshot>> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let _guard = tokio::select! {
            guard = self.refresh.lock() => guard,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        // Someone else may have refreshed while we waited for the lock.
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        self.refresh_locked(cancel).await
    }

    #[tracing::instrument(skip_all, fields(providers = self.registry().len()))]
    async fn refresh_locked(&self, cancel: &CancellationToken) -> Result<Arc<CatalogSnapshot>> {
        self.metrics.refreshes.inc();

        let report = self.fetcher.fetch_all(cancel).await?;
        self.metrics
            .provider_failures
            .add(report.failed_count() as u64);

        if report.all_failed() {
            return self.degrade("no provider returned models");
        }

        let base = self.read_state().last_known_good.clone();
        let mut entries = merge_outcomes(base.as_deref(), &report);

        let index = self.enrichment.enrichment(cancel).await;
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        apply_enrichment(&mut entries, index.as_deref());

        if entries.is_empty() {
            return self.degrade("merged catalog is empty");
        }

        let snapshot = Arc::new(CatalogSnapshot::from_entries(entries));
        let mut state = self.write_state();
        state.current = Some(Arc::clone(&snapshot));
        state.last_known_good = Some(Arc::clone(&snapshot));
        state.expires_at = Some(expiry_after(Instant::now(), self.config.ttl));
        state.degraded = false;
        state.generation += 1;
        self.metrics.published.inc();

        tracing::info!(
            models = snapshot.len(),
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            ttl_secs = self.config.ttl.as_secs(),
            "model catalog refreshed"
        );
        Ok(snapshot)
    }

    /// Total failure: serve last-known-good for a short retry window, or
    /// fail if there has never been a snapshot.
    fn degrade(&self, reason: &str) -> Result<Arc<CatalogSnapshot>> {
        let mut state = self.write_state();
        let Some(last_known_good) = state.last_known_good.clone() else {
            tracing::error!(reason, "model catalog unavailable and no previous snapshot");
            return Err(Error::NoModelsResolved);
        };

        state.current = Some(Arc::clone(&last_known_good));
        state.expires_at = Some(expiry_after(Instant::now(), self.config.degraded_ttl));
        state.degraded = true;
        state.generation += 1;
        self.metrics.degraded.inc();

        tracing::warn!(
            reason,
            models = last_known_good.len(),
            retry_in_secs = self.config.degraded_ttl.as_secs(),
            "serving last known good model catalog"
        );
        Ok(last_known_good)
    }

    fn fresh_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.read_state().fresh(Instant::now())
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogCache")
            .field("registry", self.registry())
            .field("status", &self.status())
            .field("generation", &self.generation())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::catalog::testing::helpers::{Behavior, ScriptedProvider};
    use crate::enrichment::{EnrichmentIndex, EnrichmentRecord, StaticEnrichment};
    use crate::models::ModelType;

    const HOUR: Duration = Duration::from_secs(3600);

    fn cache_for(providers: &[&Arc<ScriptedProvider>]) -> CatalogCache {
        let mut builder = ProviderRegistry::builder();
        for provider in providers {
            builder = builder.register_arc((*provider).clone());
        }
        CatalogCache::without_enrichment(builder.build(), CatalogConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_load_then_fresh_hit() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let cache = cache_for(&[&p1]);
        let token = CancellationToken::new();

        assert_eq!(cache.status(), CacheStatus::Empty);
        let first = cache.ensure_loaded(&token).await.unwrap();
        let second = cache.ensure_loaded(&token).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(p1.calls(), 1);
        assert_eq!(cache.status(), CacheStatus::Fresh);
        assert_eq!(cache.generation(), 1);
    }

    #[tokio::test]
    async fn test_unvalidated_huge_ttl_does_not_overflow() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let huge = Duration::from_secs(u64::MAX);
        let cache = CatalogCache::without_enrichment(
            ProviderRegistry::builder().register_arc(p1.clone()).build(),
            CatalogConfig::default()
                .with_ttl(huge)
                .with_degraded_ttl(huge),
        );
        let token = CancellationToken::new();

        cache.ensure_loaded(&token).await.unwrap();
        assert_eq!(cache.status(), CacheStatus::Fresh);
        assert!(cache.expires_at().unwrap() > Instant::now() + 300 * 24 * HOUR);

        p1.set(Behavior::Fail);
        cache.invalidate();
        cache.ensure_loaded(&token).await.unwrap();
        assert_eq!(cache.status(), CacheStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_after_ttl() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let cache = cache_for(&[&p1]);
        let token = CancellationToken::new();

        cache.ensure_loaded(&token).await.unwrap();
        tokio::time::advance(6 * HOUR + Duration::from_secs(1)).await;
        assert_eq!(cache.status(), CacheStatus::Stale);

        p1.set(Behavior::models(&["p1/a", "p1/b"]));
        let snapshot = cache.ensure_loaded(&token).await.unwrap();

        assert_eq!(p1.calls(), 2);
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_keeps_other_providers() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let p2 = ScriptedProvider::new("p2", Behavior::models(&["p2/b"]));
        let p3 = ScriptedProvider::new("p3", Behavior::Fail);
        let cache = cache_for(&[&p1, &p2, &p3]);
        let token = CancellationToken::new();

        let first = cache.ensure_loaded(&token).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.count_for("p3"), 0);

        tokio::time::advance(7 * HOUR).await;
        p2.set(Behavior::models(&["p2/b2"]));
        let second = cache.ensure_loaded(&token).await.unwrap();

        assert!(second.contains("p1/a"));
        assert!(second.contains("p2/b2"));
        assert!(!second.contains("p2/b"));
        assert_eq!(second.count_for("p3"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_provider_entries_survive_refresh() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let p2 = ScriptedProvider::new("p2", Behavior::models(&["p2/b", "p2/c"]));
        let cache = cache_for(&[&p1, &p2]);
        let token = CancellationToken::new();

        cache.ensure_loaded(&token).await.unwrap();
        tokio::time::advance(7 * HOUR).await;
        p2.set(Behavior::Fail);
        let snapshot = cache.ensure_loaded(&token).await.unwrap();

        assert_eq!(snapshot.count_for("p2"), 2);
        assert_eq!(cache.status(), CacheStatus::Fresh);
        assert_eq!(cache.metrics().provider_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_total_failure_is_fatal() {
        let p1 = ScriptedProvider::new("p1", Behavior::Fail);
        let p2 = ScriptedProvider::new("p2", Behavior::Panic);
        let cache = cache_for(&[&p1, &p2]);

        let err = cache
            .ensure_loaded(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoModelsResolved));
        assert_eq!(cache.status(), CacheStatus::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_total_failure_degrades_with_short_ttl() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a", "p1/b", "p1/c"]));
        let cache = cache_for(&[&p1]);
        let token = CancellationToken::new();

        let good = cache.ensure_loaded(&token).await.unwrap();
        tokio::time::advance(7 * HOUR).await;
        p1.set(Behavior::Fail);

        let served = cache.ensure_loaded(&token).await.unwrap();
        assert!(Arc::ptr_eq(&good, &served));
        assert_eq!(cache.status(), CacheStatus::Degraded);

        let remaining = cache.expires_at().unwrap() - Instant::now();
        assert!(remaining <= Duration::from_secs(15 * 60));
        assert!(remaining > Duration::from_secs(14 * 60));
        assert_eq!(cache.metrics().degraded, 1);

        // Within the degraded window no new upstream round is made.
        cache.ensure_loaded(&token).await.unwrap();
        assert_eq!(p1.calls(), 2);

        // Recovery after the short window.
        tokio::time::advance(Duration::from_secs(15 * 60 + 1)).await;
        p1.set(Behavior::models(&["p1/a"]));
        let recovered = cache.ensure_loaded(&token).await.unwrap();
        assert_eq!(recovered.len(), 1);
        assert_eq!(cache.status(), CacheStatus::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_merge_degrades() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let cache = cache_for(&[&p1]);
        let token = CancellationToken::new();

        cache.ensure_loaded(&token).await.unwrap();
        tokio::time::advance(7 * HOUR).await;
        p1.set(Behavior::models(&[]));

        let served = cache.ensure_loaded(&token).await.unwrap();
        assert!(served.contains("p1/a"));
        assert_eq!(cache.status(), CacheStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_empty_lists_are_fatal() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&[]));
        let cache = cache_for(&[&p1]);

        let err = cache
            .ensure_loaded(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoModelsResolved));
    }

    #[tokio::test]
    async fn test_concurrent_cold_callers_share_one_round() {
        let p1 = ScriptedProvider::new(
            "p1",
            Behavior::Delayed(Duration::from_millis(50), vec!["p1/a".into()]),
        );
        let cache = Arc::new(cache_for(&[&p1]));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.ensure_loaded(&CancellationToken::new()).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 1);
        }

        assert_eq!(p1.calls(), 1);
        assert_eq!(cache.metrics().refreshes, 1);
    }

    #[tokio::test]
    async fn test_cancelled_refresh_publishes_nothing() {
        let p1 = ScriptedProvider::new("p1", Behavior::Hang);
        let cache = cache_for(&[&p1]);

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = cache.ensure_loaded(&token).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(cache.status(), CacheStatus::Empty);

        // The next caller runs its own round.
        p1.set(Behavior::models(&["p1/a"]));
        let snapshot = cache
            .ensure_loaded(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_keeps_snapshot_readable() {
        let p1 = ScriptedProvider::new("p1", Behavior::models(&["p1/a"]));
        let cache = cache_for(&[&p1]);
        let token = CancellationToken::new();

        cache.ensure_loaded(&token).await.unwrap();
        cache.invalidate();

        assert_eq!(cache.status(), CacheStatus::Stale);
        assert!(cache.snapshot().is_some());

        cache.ensure_loaded(&token).await.unwrap();
        assert_eq!(p1.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrichment_is_coalesced_on_publish() {
        let p1 = ScriptedProvider::new("openai", Behavior::models(&["openai/gpt-4o"]));
        let registry = ProviderRegistry::builder()
            .register_arc(p1.clone())
            .build();
        let enrichment = StaticEnrichment::new(EnrichmentIndex::new(vec![EnrichmentRecord {
            id: "gpt-4o".into(),
            context_window: Some(128_000),
            ..Default::default()
        }]));
        let cache = CatalogCache::new(registry, Arc::new(enrichment), CatalogConfig::default());

        let snapshot = cache.ensure_loaded(&CancellationToken::new()).await.unwrap();
        let model = &snapshot.get("openai/gpt-4o").unwrap().model;
        assert_eq!(model.context_window, Some(128_000));
        assert_eq!(model.model_type, Some(ModelType::Language));
    }
}
