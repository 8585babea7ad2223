//! Builds the next snapshot's entries from last-known-good plus a fetch round.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::fetcher::FetchReport;
use super::snapshot::{CatalogSnapshot, ProviderEntry};
use crate::enrichment::EnrichmentIndex;
use crate::models::ModelType;

/// Selective invalidation.
///
/// Starts from `base`, drops every entry owned by a provider that answered
/// this round, then inserts what those providers returned. Entries of
/// providers that failed this round are carried over untouched. On id
/// collision the later insert wins.
pub fn merge_outcomes(
    base: Option<&CatalogSnapshot>,
    report: &FetchReport,
) -> BTreeMap<String, ProviderEntry> {
    let responders = report.succeeded_ids();

    let mut entries: BTreeMap<String, ProviderEntry> = base
        .map(|snapshot| snapshot.entries().clone())
        .unwrap_or_default();
    entries.retain(|_, entry| {
        !responders
            .iter()
            .any(|responder| entry.is_owned_by(responder))
    });

    for (provider, models) in report.succeeded() {
        for model in models {
            if model.id.trim().is_empty() {
                tracing::debug!(
                    provider = provider.identifier(),
                    "skipping model without id"
                );
                continue;
            }
            entries.insert(
                model.key(),
                ProviderEntry::new(model.clone(), Arc::clone(provider)),
            );
        }
    }

    entries
}

/// Coalesce feed metadata into every entry, then guess `type` where neither
/// the provider nor the feed set one. Never overwrites a set field.
///
/// A feed-provided type takes precedence over the local heuristic, which only
/// fills a type that is still unset after coalescing.
pub fn apply_enrichment(
    entries: &mut BTreeMap<String, ProviderEntry>,
    index: Option<&EnrichmentIndex>,
) {
    let mut enriched = 0usize;
    for entry in entries.values_mut() {
        if let Some(record) = index.and_then(|index| index.find(&entry.model.id)) {
            record.coalesce_into(&mut entry.model);
            enriched += 1;
        }
        if entry.model.model_type.is_none() {
            entry.model.model_type = Some(ModelType::guess(&entry.model.id));
        }
    }
    tracing::debug!(
        entries = entries.len(),
        enriched,
        "applied enrichment to catalog entries"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fetcher::{ProviderFetch, ProviderOutcome};
    use crate::enrichment::EnrichmentRecord;
    use crate::models::Model;
    use crate::providers::{ModelProvider, StaticProvider};

    fn provider(id: &str) -> Arc<dyn ModelProvider> {
        Arc::new(StaticProvider::new(id, vec![]))
    }

    fn ok(provider: &Arc<dyn ModelProvider>, ids: &[&str]) -> ProviderFetch {
        ProviderFetch {
            provider: Arc::clone(provider),
            outcome: ProviderOutcome::Succeeded(ids.iter().map(|id| Model::new(*id, *id)).collect()),
        }
    }

    fn failed(provider: &Arc<dyn ModelProvider>) -> ProviderFetch {
        ProviderFetch {
            provider: Arc::clone(provider),
            outcome: ProviderOutcome::Failed("down".into()),
        }
    }

    #[test]
    fn test_first_round_without_base() {
        let (p1, p2, p3) = (provider("p1"), provider("p2"), provider("p3"));
        let report = FetchReport {
            results: vec![ok(&p1, &["p1/a"]), ok(&p2, &["p2/b"]), failed(&p3)],
        };

        let entries = merge_outcomes(None, &report);
        assert_eq!(entries.len(), 2);
        assert!(entries.contains_key("p1/a"));
        assert!(entries.contains_key("p2/b"));
    }

    #[test]
    fn test_failed_provider_entries_survive() {
        let (p1, p2) = (provider("p1"), provider("p2"));
        let base = CatalogSnapshot::from_entries(merge_outcomes(
            None,
            &FetchReport {
                results: vec![ok(&p1, &["p1/a", "p1/old"]), ok(&p2, &["p2/b"])],
            },
        ));

        let entries = merge_outcomes(
            Some(&base),
            &FetchReport {
                results: vec![ok(&p1, &["p1/a", "p1/new"]), failed(&p2)],
            },
        );

        assert!(entries.contains_key("p1/a"));
        assert!(entries.contains_key("p1/new"));
        assert!(!entries.contains_key("p1/old"));
        assert!(entries.contains_key("p2/b"));
        assert_eq!(entries["p2/b"].provider_id(), "p2");
    }

    #[test]
    fn test_responder_with_empty_list_drops_its_entries() {
        let (p1, p2) = (provider("p1"), provider("p2"));
        let base = CatalogSnapshot::from_entries(merge_outcomes(
            None,
            &FetchReport {
                results: vec![ok(&p1, &["p1/a"]), ok(&p2, &["p2/b"])],
            },
        ));

        let entries = merge_outcomes(
            Some(&base),
            &FetchReport {
                results: vec![ok(&p1, &[]), ok(&p2, &["p2/b"])],
            },
        );
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["p2/b"]);
    }

    #[test]
    fn test_collision_later_insert_wins() {
        let (p1, p2) = (provider("p1"), provider("p2"));
        let report = FetchReport {
            results: vec![ok(&p1, &["shared/Model"]), ok(&p2, &["shared/model"])],
        };

        let entries = merge_outcomes(None, &report);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["shared/model"].provider_id(), "p2");
    }

    #[test]
    fn test_blank_ids_skipped() {
        let p1 = provider("p1");
        let report = FetchReport {
            results: vec![ok(&p1, &["", "  ", "p1/a"])],
        };
        assert_eq!(merge_outcomes(None, &report).len(), 1);
    }

    #[test]
    fn test_enrichment_coalesces_then_guesses_type() {
        let p1 = provider("p1");
        let mut entries = merge_outcomes(
            None,
            &FetchReport {
                results: vec![ok(&p1, &["p1/gpt-4o", "p1/text-embedding-3-large", "p1/custom"])],
            },
        );
        entries
            .get_mut("p1/gpt-4o")
            .unwrap()
            .model
            .context_window = Some(64_000);

        let index = EnrichmentIndex::new(vec![
            EnrichmentRecord {
                id: "gpt-4o".into(),
                context_window: Some(128_000),
                max_tokens: Some(16_384),
                ..Default::default()
            },
            EnrichmentRecord {
                id: "custom".into(),
                model_type: Some("image".into()),
                ..Default::default()
            },
        ]);

        apply_enrichment(&mut entries, Some(&index));

        let gpt = &entries["p1/gpt-4o"].model;
        assert_eq!(gpt.context_window, Some(64_000));
        assert_eq!(gpt.max_tokens, Some(16_384));
        assert_eq!(gpt.model_type, Some(ModelType::Language));
        assert_eq!(
            entries["p1/text-embedding-3-large"].model.model_type,
            Some(ModelType::Embedding)
        );
        assert_eq!(entries["p1/custom"].model.model_type, Some(ModelType::Image));
    }

    #[test]
    fn test_without_enrichment_types_are_guessed() {
        let p1 = provider("p1");
        let mut entries = merge_outcomes(
            None,
            &FetchReport {
                results: vec![ok(&p1, &["p1/whisper-1"])],
            },
        );
        apply_enrichment(&mut entries, None);
        assert_eq!(
            entries["p1/whisper-1"].model.model_type,
            Some(ModelType::Transcription)
        );
    }
}
