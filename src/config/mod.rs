//! Catalog and enrichment configuration.
//!
//! ```rust,no_run
//! use model_gateway::config::GatewayConfig;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

pub mod env;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use env::EnvSource;

pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_DEGRADED_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_ENRICHMENT_TTL: Duration = Duration::from_secs(6 * 60 * 60);
pub const DEFAULT_ENRICHMENT_NEGATIVE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ENRICHMENT_URL: &str = "https://openrouter.ai/api";
/// Upper bound for every configured duration.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// The key with invalid value
        key: String,
        /// Error message
        message: String,
    },

    /// Environment variable error
    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    /// Multiple validation errors
    #[error("{0}")]
    ValidationErrors(ValidationErrors),
}

#[derive(Debug)]
pub struct ValidationErrors(pub Vec<ConfigError>);

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation failed: ")?;
        let msgs: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", msgs.join("; "))
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Catalog cache timing and default routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// How long a successful refresh stays fresh.
    #[serde(with = "duration_secs", rename = "ttl_secs")]
    pub ttl: Duration,
    /// Retry window after a round where every provider failed.
    #[serde(with = "duration_secs", rename = "degraded_ttl_secs")]
    pub degraded_ttl: Duration,
    /// Provider used by default routing when no provider has credentials.
    pub default_provider: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CATALOG_TTL,
            degraded_ttl: DEFAULT_DEGRADED_TTL,
            default_provider: None,
        }
    }
}

impl CatalogConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_degraded_ttl(mut self, ttl: Duration) -> Self {
        self.degraded_ttl = ttl;
        self
    }

    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    fn load(source: &EnvSource) -> ConfigResult<Self> {
        let mut config = Self::default();
        if let Some(secs) = source.get::<u64>("catalog.ttl_secs")? {
            config.ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = source.get::<u64>("catalog.degraded_ttl_secs")? {
            config.degraded_ttl = Duration::from_secs(secs);
        }
        config.default_provider = source.get_raw("default.provider")?;
        Ok(config)
    }

    fn validate_into(&self, errors: &mut Vec<ConfigError>) {
        if self.ttl.is_zero() {
            errors.push(invalid("catalog.ttl", "must be greater than zero"));
        }
        if self.degraded_ttl.is_zero() {
            errors.push(invalid("catalog.degraded_ttl", "must be greater than zero"));
        }
        check_ceiling("catalog.ttl", self.ttl, errors);
        check_ceiling("catalog.degraded_ttl", self.degraded_ttl, errors);
        if self.degraded_ttl > self.ttl {
            errors.push(invalid(
                "catalog.degraded_ttl",
                "must not exceed the catalog ttl",
            ));
        }
    }
}

/// Metadata feed location and cache windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    /// Base URL; `/v1/models` is appended.
    pub base_url: String,
    #[serde(with = "duration_secs", rename = "ttl_secs")]
    pub ttl: Duration,
    /// How long a failed or empty fetch is remembered.
    #[serde(with = "duration_secs", rename = "negative_ttl_secs")]
    pub negative_ttl: Duration,
    #[serde(with = "duration_secs", rename = "timeout_secs")]
    pub timeout: Duration,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_ENRICHMENT_URL.to_string(),
            ttl: DEFAULT_ENRICHMENT_TTL,
            negative_ttl: DEFAULT_ENRICHMENT_NEGATIVE_TTL,
            timeout: DEFAULT_ENRICHMENT_TIMEOUT,
        }
    }
}

impl EnrichmentConfig {
    pub fn base_url(url: impl Into<String>) -> Self {
        Self {
            base_url: url.into(),
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_negative_ttl(mut self, ttl: Duration) -> Self {
        self.negative_ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of the model listing endpoint.
    pub fn models_url(&self) -> ConfigResult<url::Url> {
        let base = self.base_url.trim_end_matches('/');
        url::Url::parse(&format!("{}/v1/models", base)).map_err(|e| ConfigError::InvalidValue {
            key: "enrichment.url".into(),
            message: e.to_string(),
        })
    }

    fn load(source: &EnvSource) -> ConfigResult<Self> {
        let mut config = Self::default();
        if let Some(url) = source.get_raw("enrichment.url")? {
            config.base_url = url;
        }
        if let Some(secs) = source.get::<u64>("enrichment.ttl_secs")? {
            config.ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = source.get::<u64>("enrichment.negative_ttl_secs")? {
            config.negative_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = source.get::<u64>("enrichment.timeout_secs")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(disabled) = source.flag("enrichment.disabled")? {
            config.enabled = !disabled;
        }
        Ok(config)
    }

    fn validate_into(&self, errors: &mut Vec<ConfigError>) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.models_url() {
            errors.push(e);
        }
        if self.ttl.is_zero() {
            errors.push(invalid("enrichment.ttl", "must be greater than zero"));
        }
        if self.negative_ttl.is_zero() {
            errors.push(invalid("enrichment.negative_ttl", "must be greater than zero"));
        }
        if self.timeout.is_zero() {
            errors.push(invalid("enrichment.timeout", "must be greater than zero"));
        }
        check_ceiling("enrichment.ttl", self.ttl, errors);
        check_ceiling("enrichment.negative_ttl", self.negative_ttl, errors);
        check_ceiling("enrichment.timeout", self.timeout, errors);
    }
}

/// Complete configuration for the catalog subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub catalog: CatalogConfig,
    pub enrichment: EnrichmentConfig,
}

impl GatewayConfig {
    /// Load from `GATEWAY_*` environment variables over the defaults.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_source(&EnvSource::new())
    }

    pub fn from_source(source: &EnvSource) -> ConfigResult<Self> {
        Ok(Self {
            catalog: CatalogConfig::load(source)?,
            enrichment: EnrichmentConfig::load(source)?,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();
        self.catalog.validate_into(&mut errors);
        self.enrichment.validate_into(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationErrors(ValidationErrors(errors)))
        }
    }
}

fn check_ceiling(key: &str, value: Duration, errors: &mut Vec<ConfigError>) {
    if value > MAX_DURATION {
        errors.push(invalid(key, "must not exceed 365 days"));
    }
}

/// `now + ttl`, saturating at [`MAX_DURATION`] past `now` for configs that
/// skipped validation.
pub(crate) fn expiry_after(now: tokio::time::Instant, ttl: Duration) -> tokio::time::Instant {
    now.checked_add(ttl.min(MAX_DURATION)).unwrap_or(now)
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
