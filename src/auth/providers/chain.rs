//! Chain credential oracle.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::auth::{CredentialOracle, EnvironmentOracle};

/// Oracle that asks multiple oracles in order.
pub struct ChainOracle {
    oracles: Vec<Box<dyn CredentialOracle>>,
}

impl ChainOracle {
    /// Create with specified oracles.
    pub fn new(oracles: Vec<Box<dyn CredentialOracle>>) -> Self {
        Self { oracles }
    }

    /// Add an oracle to the chain.
    pub fn with<O: CredentialOracle + 'static>(mut self, oracle: O) -> Self {
        self.oracles.push(Box::new(oracle));
        self
    }
}

impl Default for ChainOracle {
    fn default() -> Self {
        Self {
            oracles: vec![Box::new(EnvironmentOracle::new())],
        }
    }
}

#[async_trait]
impl CredentialOracle for ChainOracle {
    fn name(&self) -> &str {
        "chain"
    }

    async fn resolve(&self, provider: &str) -> Option<SecretString> {
        for oracle in &self.oracles {
            match oracle.resolve(provider).await {
                Some(secret) if !secret.expose_secret().trim().is_empty() => {
                    tracing::debug!(provider, oracle = oracle.name(), "credential found");
                    return Some(secret);
                }
                _ => {}
            }
        }
        None
    }
}
