//! Third-party model metadata (pricing, context window, tags).
//!
//! Enrichment is advisory: it only fills fields a provider left unset, and an
//! unavailable feed never fails a catalog refresh.

mod client;
mod record;
mod source;

pub use client::EnrichmentClient;
pub use record::{EnrichmentIndex, EnrichmentRecord};
pub use source::{EnrichmentSource, NoEnrichment, StaticEnrichment};
