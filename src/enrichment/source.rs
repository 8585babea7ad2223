//! Enrichment source trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::EnrichmentIndex;

/// Best-effort provider of feed metadata for the catalog merge.
///
/// Never fails: an unavailable feed is `None`.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn enrichment(&self, cancel: &CancellationToken) -> Option<Arc<EnrichmentIndex>>;
}

/// Source that never enriches.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

#[async_trait]
impl EnrichmentSource for NoEnrichment {
    async fn enrichment(&self, _cancel: &CancellationToken) -> Option<Arc<EnrichmentIndex>> {
        None
    }
}

/// Fixed index, for embedding a bundled metadata file or for tests.
#[derive(Debug, Clone)]
pub struct StaticEnrichment {
    index: Arc<EnrichmentIndex>,
}

impl StaticEnrichment {
    pub fn new(index: EnrichmentIndex) -> Self {
        Self {
            index: Arc::new(index),
        }
    }
}

#[async_trait]
impl EnrichmentSource for StaticEnrichment {
    async fn enrichment(&self, _cancel: &CancellationToken) -> Option<Arc<EnrichmentIndex>> {
        Some(Arc::clone(&self.index))
    }
}
