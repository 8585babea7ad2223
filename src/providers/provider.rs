//! Backend capability trait.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::models::Model;

/// A backend adapter as seen by the catalog.
///
/// Request execution lives on the concrete adapter; the catalog only needs
/// a stable identifier and the ability to list models.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short identifier, e.g. `openai`. Also the credential lookup key.
    fn identifier(&self) -> &str;

    /// List the models this backend currently serves.
    ///
    /// Implementations should return [`crate::Error::Cancelled`] when `cancel`
    /// fires; every other error counts as this backend failing the round.
    async fn list_models(&self, cancel: &CancellationToken) -> Result<Vec<Model>>;
}

impl std::fmt::Debug for dyn ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelProvider")
            .field("identifier", &self.identifier())
            .finish()
    }
}
