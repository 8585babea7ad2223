//! HTTP client for the metadata feed with its own TTL cache.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::record::FeedResponse;
use super::{EnrichmentIndex, EnrichmentSource};
use crate::config::{EnrichmentConfig, expiry_after};
use crate::observability::{EnrichmentMetrics, EnrichmentMetricsSnapshot};
use crate::{Error, Result};

#[derive(Default)]
struct EnrichmentState {
    index: Option<Arc<EnrichmentIndex>>,
    expires_at: Option<Instant>,
}

impl EnrichmentState {
    fn fresh(&self, now: Instant) -> Option<Option<Arc<EnrichmentIndex>>> {
        match self.expires_at {
            Some(expires_at) if now < expires_at => Some(self.index.clone()),
            _ => None,
        }
    }
}

/// Client for `GET <base>/v1/models` on the metadata aggregator.
///
/// Successful, non-empty results are cached for the configured TTL. Failures
/// and empty results are remembered for the shorter negative TTL, during
/// which the previous index (if any) keeps being served.
pub struct EnrichmentClient {
    http: reqwest::Client,
    url: Url,
    config: EnrichmentConfig,
    state: RwLock<EnrichmentState>,
    refresh: Mutex<()>,
    metrics: EnrichmentMetrics,
}

impl EnrichmentClient {
    pub fn new(config: EnrichmentConfig) -> Result<Self> {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: EnrichmentConfig, http: reqwest::Client) -> Result<Self> {
        let url = config.models_url()?;
        Ok(Self {
            http,
            url,
            config,
            state: RwLock::new(EnrichmentState::default()),
            refresh: Mutex::new(()),
            metrics: EnrichmentMetrics::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn metrics(&self) -> EnrichmentMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drop the cached index so the next call fetches again.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = EnrichmentState::default();
    }

    /// Current feed index, fetching it when the cache window has passed.
    #[tracing::instrument(skip_all, fields(url = %self.url))]
    pub async fn get_enrichment(
        &self,
        cancel: &CancellationToken,
    ) -> Option<Arc<EnrichmentIndex>> {
        if !self.config.enabled {
            return None;
        }
        if let Some(cached) = self.cached() {
            return cached;
        }

        let _guard = tokio::select! {
            guard = self.refresh.lock() => guard,
            _ = cancel.cancelled() => return self.current(),
        };

        // Another caller may have refreshed while we waited.
        if let Some(cached) = self.cached() {
            return cached;
        }

        self.metrics.fetches.inc();
        let outcome = self.fetch(cancel).await;
        let now = Instant::now();
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        match outcome {
            Ok(index) if !index.is_empty() => {
                tracing::debug!(records = index.len(), "enrichment feed refreshed");
                state.index = Some(Arc::new(index));
                state.expires_at = Some(expiry_after(now, self.config.ttl));
            }
            Ok(_) => {
                self.metrics.failures.inc();
                tracing::warn!(
                    retry_in_secs = self.config.negative_ttl.as_secs(),
                    "enrichment feed returned no records"
                );
                state.expires_at = Some(expiry_after(now, self.config.negative_ttl));
            }
            Err(Error::Cancelled) => {}
            Err(e) => {
                self.metrics.failures.inc();
                tracing::warn!(
                    error = %e,
                    retry_in_secs = self.config.negative_ttl.as_secs(),
                    "enrichment feed unavailable"
                );
                state.expires_at = Some(expiry_after(now, self.config.negative_ttl));
            }
        }
        state.index.clone()
    }

    fn cached(&self) -> Option<Option<Arc<EnrichmentIndex>>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.fresh(Instant::now())
    }

    fn current(&self) -> Option<Arc<EnrichmentIndex>> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.index.clone()
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<EnrichmentIndex> {
        let request = async {
            let response = self
                .http
                .get(self.url.clone())
                .timeout(self.config.timeout)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(Error::Api {
                    message,
                    status: Some(status),
                });
            }

            let feed: FeedResponse = response.json().await?;
            Ok(EnrichmentIndex::new(feed.into_records()))
        };

        tokio::select! {
            result = request => result.map_err(|e| match e {
                Error::Network(ref inner) if inner.is_timeout() => Error::Timeout(self.config.timeout),
                other => other,
            }),
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }
}

#[async_trait]
impl EnrichmentSource for EnrichmentClient {
    async fn enrichment(&self, cancel: &CancellationToken) -> Option<Arc<EnrichmentIndex>> {
        self.get_enrichment(cancel).await
    }
}

impl std::fmt::Debug for EnrichmentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentClient")
            .field("url", &self.url.as_str())
            .field("enabled", &self.config.enabled)
            .finish()
    }
}
