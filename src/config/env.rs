//! Environment variable configuration source.
//!
//! Read-only: values are looked up once when a config is built.

use std::str::FromStr;

use super::{ConfigError, ConfigResult};

pub const DEFAULT_PREFIX: &str = "GATEWAY_";

/// Maps dotted config keys onto prefixed environment variables.
///
/// `catalog.ttl_secs` with prefix `GATEWAY_` reads `GATEWAY_CATALOG_TTL_SECS`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::prefixed(DEFAULT_PREFIX)
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }

    pub fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) if value.trim().is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    pub fn get<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_raw(key)? {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: self.env_key(key),
                    message: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// `1`, `true`, `yes`, `on` are true and `0`, `false`, `no`, `off` are
    /// false (any case). Anything else is an invalid value.
    pub fn flag(&self, key: &str) -> ConfigResult<Option<bool>> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(None);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: self.env_key(key),
                message: format!("expected a boolean, got '{}'", raw.trim()),
            }),
        }
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}
