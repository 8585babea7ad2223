//! Explicit credential oracle.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::auth::CredentialOracle;

/// Oracle with explicitly set secrets, keyed by provider identifier.
#[derive(Debug, Clone, Default)]
pub struct ExplicitOracle {
    secrets: HashMap<String, SecretString>,
}

impl ExplicitOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a secret for a provider.
    pub fn with(mut self, provider: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(
            provider.into().to_lowercase(),
            SecretString::from(secret.into()),
        );
        self
    }
}

#[async_trait]
impl CredentialOracle for ExplicitOracle {
    fn name(&self) -> &str {
        "explicit"
    }

    async fn resolve(&self, provider: &str) -> Option<SecretString> {
        self.secrets.get(&provider.to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[tokio::test]
    async fn test_explicit_lookup() {
        let oracle = ExplicitOracle::new().with("OpenAI", "sk-test");

        let secret = oracle.resolve("openai").await.unwrap();
        assert_eq!(secret.expose_secret(), "sk-test");
        assert!(oracle.resolve("groq").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_secret_not_configured() {
        let oracle = ExplicitOracle::new().with("openai", "");
        assert!(oracle.resolve("openai").await.is_some());
        assert!(!oracle.is_configured("openai").await);
    }
}
