//! Environment variable credential oracle.

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::auth::CredentialOracle;

const API_KEY_SUFFIX: &str = "_API_KEY";

/// Oracle that reads `<PROVIDER>_API_KEY` style variables.
///
/// `openai` maps to `OPENAI_API_KEY`, `together-ai` to `TOGETHER_AI_API_KEY`.
/// Explicit mappings override the derived name.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentOracle {
    prefix: Option<String>,
    overrides: HashMap<String, String>,
}

impl EnvironmentOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to every derived variable name.
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            overrides: HashMap::new(),
        }
    }

    /// Read `provider`'s secret from `env_var` instead of the derived name.
    pub fn with_var(mut self, provider: impl Into<String>, env_var: impl Into<String>) -> Self {
        self.overrides
            .insert(provider.into().to_lowercase(), env_var.into());
        self
    }

    fn env_key(&self, provider: &str) -> String {
        if let Some(var) = self.overrides.get(&provider.to_lowercase()) {
            return var.clone();
        }
        let base: String = provider
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        match &self.prefix {
            Some(prefix) => format!("{}{}{}", prefix, base, API_KEY_SUFFIX),
            None => format!("{}{}", base, API_KEY_SUFFIX),
        }
    }
}

#[async_trait]
impl CredentialOracle for EnvironmentOracle {
    fn name(&self) -> &str {
        "environment"
    }

    async fn resolve(&self, provider: &str) -> Option<SecretString> {
        std::env::var(self.env_key(provider))
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(SecretString::from)
    }
}
