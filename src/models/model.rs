use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::kind::ModelType;

pub type ModelId = String;

/// Per-unit prices as published by the provider or the metadata feed.
///
/// Values are kept as decimals; feeds send them either as JSON numbers or
/// as strings and both deserialize.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Decimal>,
}

impl Pricing {
    pub fn per_token(input: Decimal, output: Decimal) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
            ..Default::default()
        }
    }
}

/// One addressable unit of inference capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Provider-prefixed id, e.g. `openai/gpt-4o`.
    pub id: ModelId,
    pub name: String,
    /// `None` until set by the provider, the feed or the local guess.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<ModelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<Pricing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

impl Model {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            model_type: None,
            context_window: None,
            max_tokens: None,
            created: None,
            pricing: None,
            tags: None,
            description: None,
            owned_by: None,
        }
    }

    pub fn with_type(mut self, model_type: ModelType) -> Self {
        self.model_type = Some(model_type);
        self
    }

    pub fn with_context_window(mut self, tokens: u64) -> Self {
        self.context_window = Some(tokens);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u64) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_created(mut self, epoch_secs: i64) -> Self {
        self.created = Some(epoch_secs);
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn with_owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owned_by = Some(owner.into());
        self
    }

    /// Case-folded id used as the catalog key.
    pub fn key(&self) -> String {
        model_key(&self.id)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn is_selectable(&self) -> bool {
        self.model_type.is_none_or(|t| t.is_selectable())
    }
}

pub fn model_key(id: &str) -> String {
    id.to_lowercase()
}
