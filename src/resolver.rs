//! Routes a model id (or no id at all) to the backend that must serve it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::CredentialOracle;
use crate::catalog::{CatalogCache, ProviderEntry};
use crate::config::GatewayConfig;
use crate::enrichment::{EnrichmentClient, EnrichmentSource, NoEnrichment};
use crate::models::ModelList;
use crate::providers::{ModelProvider, ProviderRegistry};
use crate::{Error, Result};

/// Answers "which backend runs this model?" on top of a [`CatalogCache`].
pub struct ProviderResolver {
    cache: Arc<CatalogCache>,
    oracle: Arc<dyn CredentialOracle>,
    default_provider: Option<String>,
}

impl ProviderResolver {
    pub fn new(cache: Arc<CatalogCache>, oracle: Arc<dyn CredentialOracle>) -> Self {
        let default_provider = cache.config().default_provider.clone();
        Self {
            cache,
            oracle,
            default_provider,
        }
    }

    /// Wire a cache, enrichment client and resolver from configuration.
    pub fn from_config(
        registry: ProviderRegistry,
        oracle: Arc<dyn CredentialOracle>,
        config: GatewayConfig,
    ) -> Result<Self> {
        config.validate()?;
        let enrichment: Arc<dyn EnrichmentSource> = if config.enrichment.enabled {
            Arc::new(EnrichmentClient::new(config.enrichment)?)
        } else {
            Arc::new(NoEnrichment)
        };
        let cache = CatalogCache::new(registry, enrichment, config.catalog);
        Ok(Self::new(Arc::new(cache), oracle))
    }

    /// Provider used when no registered provider has credentials.
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn cache(&self) -> &Arc<CatalogCache> {
        &self.cache
    }

    /// Catalog entry for `model_id`.
    ///
    /// Exact id first (case-insensitive), then a provider-prefixed id whose
    /// suffix is `model_id`, so `gpt-4o` finds `openai/gpt-4o`.
    pub async fn lookup(&self, model_id: &str, cancel: &CancellationToken) -> Result<ProviderEntry> {
        let snapshot = self.cache.ensure_loaded(cancel).await?;

        if let Some(entry) = snapshot.get(model_id) {
            return Ok(entry.clone());
        }
        if let Some(entry) = snapshot.find_by_suffix(model_id) {
            tracing::debug!(
                model = model_id,
                resolved = %entry.model.id,
                "model resolved via suffix fallback"
            );
            return Ok(entry.clone());
        }

        Err(Error::ModelNotFound {
            model: model_id.to_string(),
        })
    }

    /// Backend that must execute `model_id`.
    pub async fn resolve(
        &self,
        model_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn ModelProvider>> {
        self.lookup(model_id, cancel)
            .await
            .map(|entry| entry.provider)
    }

    /// Default route when the request names no model.
    ///
    /// The first registered provider with a configured credential, else the
    /// configured default provider if it is registered.
    pub async fn get_provider(&self) -> Result<Arc<dyn ModelProvider>> {
        let registry = self.cache.registry();

        for provider in registry.iter() {
            if self.oracle.is_configured(provider.identifier()).await {
                return Ok(Arc::clone(provider));
            }
        }

        if let Some(fallback) = self
            .default_provider
            .as_deref()
            .and_then(|id| registry.get(id))
        {
            tracing::debug!(
                provider = fallback.identifier(),
                "no credentials configured, using default provider"
            );
            return Ok(Arc::clone(fallback));
        }

        Err(Error::NoProviders)
    }

    /// All selectable models, newest first; models without a creation time
    /// come last. Embedding and rerank models are excluded.
    pub async fn resolve_models(&self, cancel: &CancellationToken) -> Result<ModelList> {
        let snapshot = self.cache.ensure_loaded(cancel).await?;

        let mut models: Vec<_> = snapshot
            .models()
            .filter(|model| model.is_selectable())
            .cloned()
            .collect();
        models.sort_by(|a, b| b.created.cmp(&a.created));

        Ok(ModelList::new(models))
    }
}

impl std::fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderResolver")
            .field("cache", &self.cache)
            .field("oracle", &self.oracle.name())
            .field("default_provider", &self.default_provider)
            .finish()
    }
}
