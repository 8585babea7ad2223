//! Observability for the catalog subsystem.
//!
//! Logging goes through `tracing`; this module adds cheap atomic counters
//! that callers can poll for health reporting.

mod metrics;

pub use metrics::{
    CatalogMetrics, CatalogMetricsSnapshot, Counter, EnrichmentMetrics, EnrichmentMetricsSnapshot,
};
