//! Provider with a fixed model list.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::ModelProvider;
use crate::models::Model;
use crate::{Error, Result};

/// Provider whose model list is known up front.
///
/// Used for local or self-hosted backends without a listing endpoint and
/// as the always-available default route.
#[derive(Debug, Clone)]
pub struct StaticProvider {
    identifier: String,
    models: Vec<Model>,
}

impl StaticProvider {
    pub fn new(identifier: impl Into<String>, models: Vec<Model>) -> Self {
        Self {
            identifier: identifier.into(),
            models,
        }
    }

    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }
}

#[async_trait]
impl ModelProvider for StaticProvider {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn list_models(&self, cancel: &CancellationToken) -> Result<Vec<Model>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(self.models.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_list() {
        let provider = StaticProvider::new("local", vec![])
            .model(Model::new("local/llama-3-8b", "Llama 3 8B"))
            .model(Model::new("local/qwen-2.5-7b", "Qwen 2.5 7B"));

        let models = provider
            .list_models(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(provider.identifier(), "local");
    }

    #[tokio::test]
    async fn test_static_list_cancelled() {
        let provider = StaticProvider::new("local", vec![]);
        let token = CancellationToken::new();
        token.cancel();

        let err = provider.list_models(&token).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
