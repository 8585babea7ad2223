//! # model-gateway
//!
//! Model catalog resolution and caching for a multi-provider inference gateway.
//!
//! Aggregates the model listings of every registered backend, enriches them
//! with metadata from a public model feed, caches the merged catalog and
//! answers which backend must serve a given model id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use model_gateway::{
//!     ChainOracle, GatewayConfig, Model, ProviderRegistry, ProviderResolver, StaticProvider,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), model_gateway::Error> {
//!     let registry = ProviderRegistry::builder()
//!         .register(StaticProvider::new(
//!             "openai",
//!             vec![Model::new("openai/gpt-4o", "GPT-4o")],
//!         ))
//!         .build();
//!
//!     let resolver = ProviderResolver::from_config(
//!         registry,
//!         Arc::new(ChainOracle::default()),
//!         GatewayConfig::from_env()?,
//!     )?;
//!
//!     let cancel = CancellationToken::new();
//!     let provider = resolver.resolve("gpt-4o", &cancel).await?;
//!     println!("gpt-4o is served by {}", provider.identifier());
//!
//!     for model in resolver.resolve_models(&cancel).await?.data {
//!         println!("{} ({:?})", model.id, model.model_type);
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod enrichment;
pub mod models;
pub mod observability;
pub mod providers;
pub mod resolver;

pub use auth::{ChainOracle, CredentialOracle, EnvironmentOracle, ExplicitOracle};
pub use catalog::{
    CacheStatus, CatalogCache, CatalogFetcher, CatalogSnapshot, FetchReport, ProviderEntry,
    ProviderFetch, ProviderOutcome,
};
pub use config::{CatalogConfig, ConfigError, EnrichmentConfig, GatewayConfig};
pub use enrichment::{
    EnrichmentClient, EnrichmentIndex, EnrichmentRecord, EnrichmentSource, NoEnrichment,
    StaticEnrichment,
};
pub use models::{Model, ModelId, ModelList, ModelType, Pricing};
pub use observability::{CatalogMetrics, EnrichmentMetrics};
pub use providers::{ModelProvider, ProviderRegistry, ProviderRegistryBuilder, StaticProvider};
pub use resolver::ProviderResolver;

/// Error type for model-gateway operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Upstream HTTP endpoint returned an error response.
    #[error("API error (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    Api {
        message: String,
        status: Option<u16>,
    },

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation exceeded timeout.
    #[error("Operation timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(std::time::Duration),

    /// The caller's cancellation token fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// A refresh produced nothing and there is no earlier catalog to fall back on.
    #[error("no models resolved from any provider")]
    NoModelsResolved,

    /// No catalog entry matches the requested model.
    #[error("no provider found for model {model}")]
    ModelNotFound { model: String },

    /// No backend can serve a request that names no model.
    #[error("no providers found")]
    NoProviders,

    /// A backend failed to list its models.
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration or setup errors; retrying will not help
    Configuration,
    /// The requested model or provider does not exist
    NotFound,
    /// Network, upstream or empty-catalog errors that may succeed on retry
    Transient,
    /// The caller gave up
    Cancelled,
    /// Unexpected payloads or client-side HTTP errors
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::NoProviders => ErrorCategory::Configuration,

            Error::ModelNotFound { .. } => ErrorCategory::NotFound,

            Error::Network(_)
            | Error::Timeout(_)
            | Error::Provider { .. }
            | Error::NoModelsResolved => ErrorCategory::Transient,
            Error::Api {
                status: Some(429 | 500..=599),
                ..
            } => ErrorCategory::Transient,

            Error::Cancelled => ErrorCategory::Cancelled,

            Error::Json(_) | Error::Api { .. } => ErrorCategory::Internal,
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::InvalidValue { key, message } => {
                Error::Config(format!("Invalid value for {}: {}", key, message))
            }
            config::ConfigError::Env(e) => Error::Config(e.to_string()),
            config::ConfigError::ValidationErrors(errors) => Error::Config(errors.to_string()),
        }
    }
}

/// Result type alias for model-gateway operations.
pub type Result<T> = std::result::Result<T, Error>;
