//! Metadata feed records and suffix matching.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::{Model, ModelType, Pricing};

/// One entry of the metadata feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    pub id: String,
    #[serde(default)]
    pub context_window: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u64>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub pricing: Option<Pricing>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, rename = "type")]
    pub model_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub owned_by: Option<String>,
}

impl EnrichmentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Fill every unset field of `model` from this record. Set fields are
    /// left as they are.
    pub fn coalesce_into(&self, model: &mut Model) {
        fill(&mut model.context_window, self.context_window);
        fill(&mut model.max_tokens, self.max_tokens);
        fill(&mut model.created, self.created);
        fill(&mut model.pricing, self.pricing.clone());
        fill(&mut model.tags, self.tags.clone().filter(|t| !t.is_empty()));
        fill(
            &mut model.model_type,
            self.model_type.as_deref().and_then(ModelType::parse),
        );
        fill(
            &mut model.description,
            self.description.clone().filter(|d| !d.is_empty()),
        );
        fill(
            &mut model.owned_by,
            self.owned_by.clone().filter(|o| !o.is_empty()),
        );
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Wire shape of `GET /v1/models` on the feed.
#[derive(Debug, Deserialize)]
pub(crate) struct FeedResponse {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl FeedResponse {
    /// Decode records one by one so a single malformed entry does not
    /// discard the rest of the feed.
    pub(crate) fn into_records(self) -> Vec<EnrichmentRecord> {
        let total = self.data.len();
        let records: Vec<EnrichmentRecord> = self
            .data
            .into_iter()
            .filter_map(|value| serde_json::from_value::<EnrichmentRecord>(value).ok())
            .filter(|record| !record.id.trim().is_empty())
            .collect();

        if records.len() < total {
            tracing::debug!(
                skipped = total - records.len(),
                total,
                "skipped malformed enrichment records"
            );
        }
        records
    }
}

/// Feed records in feed order, with case-folded ids for matching.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentIndex {
    records: Vec<(String, EnrichmentRecord)>,
    by_id: HashMap<String, usize>,
}

impl EnrichmentIndex {
    pub fn new(records: Vec<EnrichmentRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            let key = record.id.to_lowercase();
            if index.by_id.contains_key(&key) {
                continue;
            }
            index.by_id.insert(key.clone(), index.records.len());
            index.records.push((key, record));
        }
        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exact, case-insensitive lookup.
    pub fn get(&self, id: &str) -> Option<&EnrichmentRecord> {
        self.by_id
            .get(&id.to_lowercase())
            .map(|&i| &self.records[i].1)
    }

    /// First record, in feed order, whose id is a case-insensitive suffix of
    /// `model_id`.
    ///
    /// When several records match, later ones are ignored; the feed does not
    /// say which one is meant.
    pub fn find(&self, model_id: &str) -> Option<&EnrichmentRecord> {
        let target = model_id.to_lowercase();
        let mut matches = self
            .records
            .iter()
            .filter(|(key, _)| target.ends_with(key.as_str()));

        let (_, first) = matches.next()?;
        let others = matches.count();
        if others > 0 {
            tracing::debug!(
                model = model_id,
                matched = %first.id,
                others,
                "ambiguous enrichment match, using first in feed order"
            );
        }
        Some(first)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichmentRecord> {
        self.records.iter().map(|(_, record)| record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(id: &str) -> EnrichmentRecord {
        EnrichmentRecord::new(id)
    }

    #[test]
    fn test_coalesce_fills_only_unset() {
        let mut model = Model::new("openai/gpt-4o", "GPT-4o").with_context_window(64_000);
        let record = EnrichmentRecord {
            id: "gpt-4o".into(),
            context_window: Some(128_000),
            max_tokens: Some(16_384),
            pricing: Some(Pricing::per_token(dec!(0.0000025), dec!(0.00001))),
            model_type: Some("chat".into()),
            description: Some("Omni model".into()),
            ..Default::default()
        };

        record.coalesce_into(&mut model);

        assert_eq!(model.context_window, Some(64_000));
        assert_eq!(model.max_tokens, Some(16_384));
        assert_eq!(model.model_type, Some(ModelType::Language));
        assert_eq!(model.description.as_deref(), Some("Omni model"));
        assert!(model.pricing.is_some());
    }

    #[test]
    fn test_coalesce_ignores_unknown_type_and_empty_values() {
        let mut model = Model::new("x/y", "y");
        let record = EnrichmentRecord {
            id: "y".into(),
            model_type: Some("hologram".into()),
            tags: Some(vec![]),
            owned_by: Some(String::new()),
            ..Default::default()
        };

        record.coalesce_into(&mut model);

        assert!(model.model_type.is_none());
        assert!(model.tags.is_none());
        assert!(model.owned_by.is_none());
    }

    #[test]
    fn test_suffix_match_case_insensitive() {
        let index = EnrichmentIndex::new(vec![record("GPT-4o"), record("claude-sonnet-4")]);

        assert_eq!(index.find("openai/gpt-4o").unwrap().id, "GPT-4o");
        assert_eq!(
            index.find("anthropic/Claude-Sonnet-4").unwrap().id,
            "claude-sonnet-4"
        );
        assert!(index.find("openai/o3").is_none());
    }

    #[test]
    fn test_suffix_match_first_in_feed_order() {
        let index = EnrichmentIndex::new(vec![record("4o"), record("gpt-4o")]);
        assert_eq!(index.find("openai/gpt-4o").unwrap().id, "4o");
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut first = record("gpt-4o");
        first.context_window = Some(1);
        let mut second = record("GPT-4O");
        second.context_window = Some(2);

        let index = EnrichmentIndex::new(vec![first, second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("gpt-4o").unwrap().context_window, Some(1));
    }

    #[test]
    fn test_feed_skips_malformed_records() {
        let feed: FeedResponse = serde_json::from_str(
            r#"{"data": [
                {"id": "gpt-4o", "contextWindow": 128000, "ownedBy": "openai"},
                {"id": 42},
                {"contextWindow": 1},
                {"id": "", "contextWindow": 1},
                {"id": "whisper-1", "type": "transcription", "pricing": {"request": "0.006"}}
            ]}"#,
        )
        .unwrap();

        let records = feed.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].owned_by.as_deref(), Some("openai"));
        assert_eq!(
            records[1].pricing.as_ref().unwrap().request,
            Some(dec!(0.006))
        );
    }
}
