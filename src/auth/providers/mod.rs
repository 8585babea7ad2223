//! Credential oracle implementations.

mod chain;
mod environment;
mod explicit;

pub use chain::ChainOracle;
pub use environment::EnvironmentOracle;
pub use explicit::ExplicitOracle;
