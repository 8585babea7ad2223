//! Ordered, immutable set of backend adapters.

use std::sync::Arc;

use super::ModelProvider;

/// Registry of backend adapters, in registration order.
///
/// Built once at startup and shared; order matters for default routing.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ModelProvider>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    pub fn new(providers: Vec<Arc<dyn ModelProvider>>) -> Self {
        let mut builder = Self::builder();
        for provider in providers {
            builder = builder.register_arc(provider);
        }
        builder.build()
    }

    pub fn get(&self, identifier: &str) -> Option<&Arc<dyn ModelProvider>> {
        self.providers
            .iter()
            .find(|p| p.identifier().eq_ignore_ascii_case(identifier))
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.get(identifier).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ModelProvider>> {
        self.providers.iter()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.identifier()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.identifiers())
            .finish()
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: Vec<Arc<dyn ModelProvider>>,
}

impl ProviderRegistryBuilder {
    pub fn register<P: ModelProvider + 'static>(self, provider: P) -> Self {
        self.register_arc(Arc::new(provider))
    }

    /// Registers a shared provider. A later registration with the same
    /// identifier replaces the earlier one in place.
    pub fn register_arc(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        match self
            .providers
            .iter()
            .position(|p| p.identifier().eq_ignore_ascii_case(provider.identifier()))
        {
            Some(index) => {
                tracing::debug!(
                    provider = provider.identifier(),
                    "replacing previously registered provider"
                );
                self.providers[index] = provider;
            }
            None => self.providers.push(provider),
        }
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}
