//! Model data types shared by providers, the catalog and the resolver.

mod kind;
mod model;

pub use kind::ModelType;
pub use model::{Model, ModelId, Pricing, model_key};

use serde::{Deserialize, Serialize};

/// Response shape of a model listing: `{ "object": "list", "data": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default = "list_object")]
    pub object: String,
    pub data: Vec<Model>,
}

fn list_object() -> String {
    "list".to_string()
}

impl ModelList {
    pub fn new(data: Vec<Model>) -> Self {
        Self {
            object: list_object(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
