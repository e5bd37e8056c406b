//! Remote query client.
//!
//! Sends a natural-language query to the generation model with the
//! file-search tool scoped to one or more stores, then parses the model's
//! text into validated, rank-sorted recommendations.
//!
//! Retrieval evidence gates the answer: a response with zero grounding
//! chunks yields an empty result regardless of any text the model emitted.

use std::sync::Arc;

use clinidocs_core::{AppError, AppResult};

use crate::api::FileSearchApi;
use crate::types::Recommendation;

/// Canonical path prefix for store identifiers.
const STORE_NAME_PREFIX: &str = "fileSearchStores/";

/// Client for retrieval-augmented recommendation queries.
#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn FileSearchApi>,
    model: String,
}

impl QueryClient {
    pub fn new(api: Arc<dyn FileSearchApi>, model: impl Into<String>) -> Self {
        Self {
            api,
            model: model.into(),
        }
    }

    /// Run a query against the given stores.
    ///
    /// Fails with `NoStoreSelected` before any remote call when the store
    /// set is empty. Returns recommendations sorted ascending by rank; the
    /// model's self-reported order is not trusted.
    pub async fn query(
        &self,
        text: &str,
        store_names: &[String],
    ) -> AppResult<Vec<Recommendation>> {
        if store_names.is_empty() {
            return Err(AppError::NoStoreSelected);
        }

        let normalized: Vec<String> = store_names
            .iter()
            .map(|id| normalize_store_name(id))
            .collect();

        let prompt = build_prompt(text);
        tracing::info!("Querying {} store(s)", normalized.len());

        let outcome = self
            .api
            .generate_content(&self.model, &prompt, &normalized)
            .await?;

        // Groundedness gate: no retrieval chunks means no answer, even if
        // the model produced text
        if outcome.grounding_chunk_count == 0 {
            tracing::warn!("No chunks retrieved from the selected store(s); discarding model output");
            return Ok(Vec::new());
        }

        tracing::debug!(
            "Retrieved {} grounding chunk(s)",
            outcome.grounding_chunk_count
        );

        let text = outcome.text.trim();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut recommendations = parse_recommendations(text)?;
        recommendations.sort_by_key(|r| r.rank);
        Ok(recommendations)
    }
}

/// Generation instruction: a bare JSON array of recommendation objects.
fn build_prompt(query: &str) -> String {
    format!(
        "Based on the documents in the connected knowledge store(s), analyze the \
         following query and return a JSON array of recommendations. Each \
         recommendation should have: rank (integer), title (string), \
         relevance_score (integer 0-100), summary (string), actionable_step \
         (string), and source_document (string). Return only valid JSON, no \
         markdown.\n\nQuery: {}",
        query
    )
}

/// Normalize a store identifier to its canonical path form.
pub fn normalize_store_name(id: &str) -> String {
    if id.starts_with(STORE_NAME_PREFIX) {
        id.to_string()
    } else {
        format!("{}{}", STORE_NAME_PREFIX, id)
    }
}

/// Strip an optional surrounding markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse and validate the model's JSON output.
///
/// Any parse or schema violation is `MalformedModelOutput` — fields are
/// never coerced or guessed.
fn parse_recommendations(text: &str) -> AppResult<Vec<Recommendation>> {
    let json = strip_code_fence(text);

    let recommendations: Vec<Recommendation> = serde_json::from_str(json)
        .map_err(|e| AppError::MalformedModelOutput(format!("invalid JSON: {}", e)))?;

    for rec in &recommendations {
        validate_recommendation(rec)?;
    }

    Ok(recommendations)
}

fn validate_recommendation(rec: &Recommendation) -> AppResult<()> {
    if rec.rank < 1 {
        return Err(AppError::MalformedModelOutput(format!(
            "rank must be a positive integer, got {}",
            rec.rank
        )));
    }

    if !(0..=100).contains(&rec.relevance_score) {
        return Err(AppError::MalformedModelOutput(format!(
            "relevance_score must be within 0-100, got {}",
            rec.relevance_score
        )));
    }

    let text_fields = [
        ("title", &rec.title),
        ("summary", &rec.summary),
        ("actionable_step", &rec.actionable_step),
        ("source_document", &rec.source_document),
    ];
    for (field, value) in text_fields {
        if value.trim().is_empty() {
            return Err(AppError::MalformedModelOutput(format!(
                "{} must be a non-empty string",
                field
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockFileSearchApi;
    use crate::types::GenerateOutcome;

    fn rec_json(rank: i64, score: i64) -> serde_json::Value {
        serde_json::json!({
            "rank": rank,
            "title": format!("Recommendation {}", rank),
            "relevance_score": score,
            "summary": "Summary text",
            "actionable_step": "Do the thing",
            "source_document": "protocol.pdf"
        })
    }

    fn grounded(text: String) -> GenerateOutcome {
        GenerateOutcome {
            text,
            grounding_chunk_count: 4,
        }
    }

    #[tokio::test]
    async fn test_empty_store_set_never_calls_remote() {
        let api = Arc::new(MockFileSearchApi::new());
        let client = QueryClient::new(api.clone(), "test-model");

        let result = client.query("post-op dosage for ibuprofen", &[]).await;
        assert!(matches!(result, Err(AppError::NoStoreSelected)));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_store_names_normalized() {
        let api = Arc::new(
            MockFileSearchApi::new().with_generate_outcome(GenerateOutcome::default()),
        );
        let client = QueryClient::new(api.clone(), "test-model");

        client
            .query(
                "q",
                &["abc".to_string(), "fileSearchStores/def".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(
            api.calls(),
            vec!["generate:fileSearchStores/abc,fileSearchStores/def".to_string()]
        );
    }

    #[tokio::test]
    async fn test_zero_grounding_chunks_discards_model_text() {
        let text = serde_json::json!([rec_json(1, 90)]).to_string();
        let api = Arc::new(MockFileSearchApi::new().with_generate_outcome(GenerateOutcome {
            text,
            grounding_chunk_count: 0,
        }));
        let client = QueryClient::new(api, "test-model");

        let result = client.query("q", &["abc".to_string()]).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_results_sorted_by_rank() {
        let text =
            serde_json::json!([rec_json(3, 70), rec_json(1, 95), rec_json(2, 80)]).to_string();
        let api =
            Arc::new(MockFileSearchApi::new().with_generate_outcome(grounded(text)));
        let client = QueryClient::new(api, "test-model");

        let result = client.query("q", &["abc".to_string()]).await.unwrap();
        let ranks: Vec<i64> = result.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_results_carry_valid_scores_and_sources() {
        let text = serde_json::json!([rec_json(1, 95), rec_json(2, 62)]).to_string();
        let api =
            Arc::new(MockFileSearchApi::new().with_generate_outcome(grounded(text)));
        let client = QueryClient::new(api, "test-model");

        let result = client
            .query("post-op dosage for ibuprofen", &["abc".to_string()])
            .await
            .unwrap();

        assert!(!result.is_empty());
        for rec in &result {
            assert!((0..=100).contains(&rec.relevance_score));
            assert!(!rec.source_document.is_empty());
        }
    }

    #[tokio::test]
    async fn test_code_fenced_output_accepted() {
        let inner = serde_json::json!([rec_json(1, 88)]).to_string();
        let text = format!("```json\n{}\n```", inner);
        let api =
            Arc::new(MockFileSearchApi::new().with_generate_outcome(grounded(text)));
        let client = QueryClient::new(api, "test-model");

        let result = client.query("q", &["abc".to_string()]).await.unwrap();
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_json_fails_distinctly() {
        let api = Arc::new(
            MockFileSearchApi::new().with_generate_outcome(grounded("not json at all".to_string())),
        );
        let client = QueryClient::new(api, "test-model");

        let result = client.query("q", &["abc".to_string()]).await;
        assert!(matches!(result, Err(AppError::MalformedModelOutput(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_score_rejected() {
        let text = serde_json::json!([rec_json(1, 140)]).to_string();
        let api =
            Arc::new(MockFileSearchApi::new().with_generate_outcome(grounded(text)));
        let client = QueryClient::new(api, "test-model");

        let result = client.query("q", &["abc".to_string()]).await;
        assert!(matches!(result, Err(AppError::MalformedModelOutput(_))));
    }

    #[tokio::test]
    async fn test_empty_text_field_rejected() {
        let mut rec = rec_json(1, 50);
        rec["source_document"] = serde_json::json!("   ");
        let text = serde_json::json!([rec]).to_string();
        let api =
            Arc::new(MockFileSearchApi::new().with_generate_outcome(grounded(text)));
        let client = QueryClient::new(api, "test-model");

        let result = client.query("q", &["abc".to_string()]).await;
        assert!(matches!(result, Err(AppError::MalformedModelOutput(_))));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("[1]"), "[1]");
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
    }

    #[test]
    fn test_normalize_store_name() {
        assert_eq!(normalize_store_name("abc"), "fileSearchStores/abc");
        assert_eq!(
            normalize_store_name("fileSearchStores/abc"),
            "fileSearchStores/abc"
        );
    }
}
