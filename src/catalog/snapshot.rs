//! Published, immutable view of the merged catalog.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Model, model_key};
use crate::providers::ModelProvider;

/// A model bound to the backend that must execute it.
#[derive(Clone)]
pub struct ProviderEntry {
    pub model: Model,
    pub provider: Arc<dyn ModelProvider>,
}

impl ProviderEntry {
    pub fn new(model: Model, provider: Arc<dyn ModelProvider>) -> Self {
        Self { model, provider }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.identifier()
    }

    pub(crate) fn is_owned_by(&self, provider: &str) -> bool {
        self.provider_id().eq_ignore_ascii_case(provider)
    }
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("model", &self.model.id)
            .field("provider", &self.provider_id())
            .finish()
    }
}

/// Case-insensitive map from model id to [`ProviderEntry`].
///
/// Keys are lowercased ids kept in sorted order, so iteration is
/// deterministic. A snapshot is never mutated once built; refreshes build a
/// new one and swap it in.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: BTreeMap<String, ProviderEntry>,
}

impl CatalogSnapshot {
    pub(crate) fn from_entries(entries: BTreeMap<String, ProviderEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, ProviderEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-insensitive lookup.
    pub fn get(&self, model_id: &str) -> Option<&ProviderEntry> {
        self.entries.get(&model_key(model_id))
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.get(model_id).is_some()
    }

    /// First entry, in key order, whose id ends with `/<model_id>`.
    ///
    /// Resolves provider-less ids such as `gpt-4o` against `openai/gpt-4o`.
    /// When more than one provider exposes the same suffix the first key
    /// wins and the collision is logged.
    pub fn find_by_suffix(&self, model_id: &str) -> Option<&ProviderEntry> {
        let suffix = format!("/{}", model_key(model_id));
        let mut matches = self
            .entries
            .iter()
            .filter(|(key, _)| key.ends_with(&suffix));

        let (key, first) = matches.next()?;
        let others: Vec<&str> = matches.map(|(k, _)| k.as_str()).collect();
        if !others.is_empty() {
            tracing::warn!(
                model = model_id,
                resolved = %key,
                ambiguous_with = ?others,
                "bare model id matches several providers, using first"
            );
        }
        Some(first)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderEntry> {
        self.entries.values()
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.entries.values().map(|entry| &entry.model)
    }

    /// Number of entries owned by `provider`.
    pub fn count_for(&self, provider: &str) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.is_owned_by(provider))
            .count()
    }
}
