//! Fan-out of model listing calls across all registered providers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::models::Model;
use crate::providers::{ModelProvider, ProviderRegistry};
use crate::{Error, Result};

/// What one provider produced in a fetch round.
#[derive(Debug, Clone)]
pub enum ProviderOutcome {
    Succeeded(Vec<Model>),
    Failed(String),
}

impl ProviderOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }
}

#[derive(Debug, Clone)]
pub struct ProviderFetch {
    pub provider: Arc<dyn ModelProvider>,
    pub outcome: ProviderOutcome,
}

impl ProviderFetch {
    pub fn provider_id(&self) -> &str {
        self.provider.identifier()
    }
}

/// Per-provider results of one round, in registry order.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub results: Vec<ProviderFetch>,
}

impl FetchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&Arc<dyn ModelProvider>, &[Model])> {
        self.results.iter().filter_map(|r| match &r.outcome {
            ProviderOutcome::Succeeded(models) => Some((&r.provider, models.as_slice())),
            ProviderOutcome::Failed(_) => None,
        })
    }

    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.succeeded_count()
    }

    pub fn all_failed(&self) -> bool {
        self.succeeded_count() == 0
    }

    /// Lowercased identifiers of the providers that answered this round.
    pub fn succeeded_ids(&self) -> Vec<String> {
        self.succeeded()
            .map(|(provider, _)| provider.identifier().to_lowercase())
            .collect()
    }
}

/// Calls every provider's listing concurrently and isolates failures.
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    registry: ProviderRegistry,
}

impl CatalogFetcher {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// One listing call per provider, all in flight at once.
    ///
    /// Provider errors and panics become [`ProviderOutcome::Failed`]. Only
    /// cancellation of `cancel` fails the whole round; outstanding calls are
    /// aborted when it fires.
    pub async fn fetch_all(&self, cancel: &CancellationToken) -> Result<FetchReport> {
        let providers: Vec<Arc<dyn ModelProvider>> = self.registry.iter().cloned().collect();
        let mut slots: Vec<Option<ProviderOutcome>> = vec![None; providers.len()];
        let mut index_by_task = HashMap::with_capacity(providers.len());
        let mut tasks = JoinSet::new();

        for (index, provider) in providers.iter().enumerate() {
            let provider = Arc::clone(provider);
            let token = cancel.child_token();
            let span = tracing::debug_span!("list_models", provider = provider.identifier());
            let handle = tasks.spawn(
                async move { provider.list_models(&token).await }.instrument(span),
            );
            index_by_task.insert(handle.id(), index);
        }

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(Error::Cancelled);
                }
                next = tasks.join_next_with_id() => next,
            };
            let Some(joined) = joined else { break };

            let (task_id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_error) => {
                    let message = if join_error.is_panic() {
                        "listing task panicked".to_string()
                    } else {
                        join_error.to_string()
                    };
                    (join_error.id(), Err(Error::Provider {
                        provider: String::new(),
                        message,
                    }))
                }
            };
            let Some(&index) = index_by_task.get(&task_id) else {
                continue;
            };
            let provider_id = providers[index].identifier();

            let outcome = match result {
                Ok(models) => {
                    tracing::debug!(provider = provider_id, models = models.len(), "provider listed models");
                    ProviderOutcome::Succeeded(models)
                }
                Err(Error::Cancelled) if cancel.is_cancelled() => {
                    tasks.abort_all();
                    return Err(Error::Cancelled);
                }
                Err(e) => {
                    let message = match e {
                        Error::Provider { message, .. } => message,
                        other => other.to_string(),
                    };
                    tracing::warn!(provider = provider_id, error = %message, "provider model listing failed");
                    ProviderOutcome::Failed(message)
                }
            };
            slots[index] = Some(outcome);
        }

        let results = providers
            .into_iter()
            .zip(slots)
            .map(|(provider, outcome)| ProviderFetch {
                provider,
                outcome: outcome
                    .unwrap_or_else(|| ProviderOutcome::Failed("listing did not complete".into())),
            })
            .collect();

        Ok(FetchReport { results })
    }
}
