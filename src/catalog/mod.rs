//! Model catalog: aggregation, merge and caching.
//!
//! ```text
//! CatalogCache::ensure_loaded
//!   ├─ fast path: fresh snapshot, no refresh lock
//!   └─ refresh lock → re-check → CatalogFetcher (one task per provider)
//!        → merge_outcomes (selective invalidation over last-known-good)
//!        → apply_enrichment (coalesce only) → publish or degrade
//! ```

mod cache;
mod fetcher;
mod merge;
mod snapshot;
mod testing;

pub use cache::{CacheStatus, CatalogCache};
pub use fetcher::{CatalogFetcher, FetchReport, ProviderFetch, ProviderOutcome};
pub use merge::{apply_enrichment, merge_outcomes};
pub use snapshot::{CatalogSnapshot, ProviderEntry};
