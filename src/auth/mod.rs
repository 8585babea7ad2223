//! Credential presence checks used for default routing.
//!
//! Secrets are stored and injected elsewhere; this module only answers
//! whether a backend has one:
//! - **Environment**: `<PROVIDER>_API_KEY` variables
//! - **Explicit**: secrets supplied in code
//! - **Chain**: first oracle with a non-blank secret wins

mod oracle;
mod providers;

pub use oracle::CredentialOracle;
pub use providers::{ChainOracle, EnvironmentOracle, ExplicitOracle};
