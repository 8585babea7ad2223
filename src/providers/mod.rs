//! Backend adapters as seen by the model catalog.
//!
//! Each backend implements [`ModelProvider`]; the set of backends is fixed at
//! startup in a [`ProviderRegistry`].

mod provider;
mod registry;
mod static_provider;

pub use provider::ModelProvider;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use static_provider::StaticProvider;
