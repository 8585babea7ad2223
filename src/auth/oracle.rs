//! Credential presence lookup.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// Answers "is provider X configured?".
///
/// The catalog never uses the secret itself, only whether one exists.
#[async_trait]
pub trait CredentialOracle: Send + Sync {
    /// Oracle name for debugging.
    fn name(&self) -> &str;

    /// Secret configured for `provider`, if any.
    async fn resolve(&self, provider: &str) -> Option<SecretString>;

    /// Whether `provider` has a non-blank secret.
    async fn is_configured(&self, provider: &str) -> bool {
        self.resolve(provider)
            .await
            .is_some_and(|secret| !secret.expose_secret().trim().is_empty())
    }
}
