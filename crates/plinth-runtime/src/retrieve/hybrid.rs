//! Hybrid search: parallel vector subqueries plus one compound FTS match.

use futures::StreamExt;
use plinth_postgres::PgConnection;
use plinth_postgres::model::FtsChunkHit;
use plinth_postgres::query::DocumentChunkRepository;
use plinth_inference::provider::EmbeddingProvider;
use plinth_vector::{QueryOptions, VectorIndex, VectorQueryResult};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::TRACING_TARGET;

/// Relative acceptance factor for adaptive thresholding.
///
/// Providers differ in their absolute similarity ranges; a match is accepted
/// when its score reaches `max(min_similarity, top_score × factor)` within
/// its own subquery.
pub(crate) const RELATIVE_SCORE_FACTOR: f32 = 0.7;

/// Upper bound on concurrent vector subqueries.
const MAX_SUBQUERY_CONCURRENCY: usize = 10;

/// One dense match with the metadata the index returned.
#[derive(Debug, Clone)]
pub(crate) struct VectorHit {
    /// Chunk id (vector id).
    pub id: String,
    /// Dense similarity score.
    pub score: f32,
    /// Owning source, from vector metadata.
    pub source_id: Option<Uuid>,
    /// Chunk index, from vector metadata.
    pub chunk_index: Option<i32>,
    /// File name, from vector metadata.
    pub file_name: Option<String>,
}

/// Result of the vector fan-out: one ranked hit list per variation.
#[derive(Debug, Default)]
pub(crate) struct VectorStageOutcome {
    /// One result set per query variation, in variation order.
    pub result_sets: Vec<Vec<VectorHit>>,
    /// Degradation warnings.
    pub warnings: Vec<String>,
}

/// Embeds every variation in one batch, then runs the subqueries in
/// parallel with bounded fan-out.
pub(crate) async fn vector_stage(
    embeddings: &EmbeddingProvider,
    index: &VectorIndex,
    namespace: &str,
    variations: &[String],
    per_query_k: usize,
    min_similarity: f64,
    cancel: &CancellationToken,
) -> VectorStageOutcome {
    let mut outcome = VectorStageOutcome::default();

    let vectors = match embeddings.embed_texts(variations.to_vec(), cancel).await {
        Ok(vectors) => vectors,
        Err(error) => {
            outcome
                .warnings
                .push(format!("query embedding failed: {error}"));
            return outcome;
        }
    };

    let subqueries = vectors.into_iter().enumerate().map(|(i, vector)| {
        let variation = variations.get(i).cloned().unwrap_or_default();
        async move {
            let result = index
                .query(
                    namespace,
                    vector,
                    per_query_k,
                    QueryOptions::new().with_metadata(),
                )
                .await;
            (variation, result)
        }
    });

    let results: Vec<_> = futures::stream::iter(subqueries)
        .buffered(MAX_SUBQUERY_CONCURRENCY)
        .collect()
        .await;

    for (variation, result) in results {
        match result {
            Ok(hits) => {
                let accepted = apply_adaptive_threshold(hits, min_similarity as f32);
                outcome
                    .result_sets
                    .push(accepted.into_iter().map(VectorHit::from).collect());
            }
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    variation = %variation,
                    error = %error,
                    "Vector subquery failed"
                );
                outcome
                    .warnings
                    .push(format!("vector subquery failed for '{variation}': {error}"));
                outcome.result_sets.push(Vec::new());
            }
        }
    }

    outcome
}

/// Runs the compound FTS match; degrades to empty results with a warning.
pub(crate) async fn fts_stage(
    conn: &mut PgConnection,
    agent_id: Uuid,
    keywords: &[String],
    limit: usize,
) -> (Vec<FtsChunkHit>, Option<String>) {
    let Some(match_expr) = build_match_expression(keywords) else {
        return (Vec::new(), None);
    };

    match conn
        .search_chunks_fts(agent_id, &match_expr, limit as i64)
        .await
    {
        Ok(hits) => (hits, None),
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET,
                agent_id = %agent_id,
                error = %error,
                "FTS query failed; degrading to vector-only"
            );
            (
                Vec::new(),
                Some(format!("full-text search unavailable: {error}")),
            )
        }
    }
}

/// Accepts matches scoring at least
/// `max(min_similarity, top_score × RELATIVE_SCORE_FACTOR)`.
pub(crate) fn apply_adaptive_threshold(
    hits: Vec<VectorQueryResult>,
    min_similarity: f32,
) -> Vec<VectorQueryResult> {
    let Some(top_score) = hits.iter().map(|h| h.score).reduce(f32::max) else {
        return hits;
    };

    let threshold = min_similarity.max(top_score * RELATIVE_SCORE_FACTOR);
    hits.into_iter().filter(|h| h.score >= threshold).collect()
}

/// Builds the `"term1" OR "term2"` compound expression.
///
/// Terms are double-quoted; embedded quotes are dropped rather than escaped.
pub(crate) fn build_match_expression(keywords: &[String]) -> Option<String> {
    let terms: Vec<String> = keywords
        .iter()
        .map(|k| k.replace('"', " "))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .map(|k| format!("\"{k}\""))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

impl From<VectorQueryResult> for VectorHit {
    fn from(result: VectorQueryResult) -> Self {
        let source_id = result
            .metadata
            .get("sourceId")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok());
        let chunk_index = result
            .metadata
            .get("chunkIndex")
            .and_then(|v| v.as_i64())
            .map(|i| i as i32);
        let file_name = result
            .metadata
            .get("fileName")
            .and_then(|v| v.as_str())
            .map(String::from);

        Self {
            id: result.id,
            score: result.score,
            source_id,
            chunk_index,
            file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn hit(id: &str, score: f32) -> VectorQueryResult {
        VectorQueryResult {
            id: id.to_string(),
            score,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn adaptive_threshold_tracks_top_score() {
        // Top score 0.9 → relative floor 0.63 dominates min_similarity 0.3.
        let accepted = apply_adaptive_threshold(
            vec![hit("a", 0.9), hit("b", 0.7), hit("c", 0.5)],
            0.3,
        );
        let ids: Vec<&str> = accepted.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn absolute_floor_still_applies() {
        // Low-scoring subquery: relative floor 0.14 is below min_similarity.
        let accepted = apply_adaptive_threshold(vec![hit("a", 0.2), hit("b", 0.1)], 0.3);
        assert!(accepted.is_empty());
    }

    #[test]
    fn empty_hits_pass_through() {
        assert!(apply_adaptive_threshold(vec![], 0.3).is_empty());
    }

    #[test]
    fn match_expression_quotes_and_joins() {
        let expr = build_match_expression(&[
            "refund".to_string(),
            "policy".to_string(),
        ])
        .unwrap();
        assert_eq!(expr, "\"refund\" OR \"policy\"");
    }

    #[test]
    fn match_expression_drops_embedded_quotes() {
        let expr = build_match_expression(&["re\"fund".to_string()]).unwrap();
        assert_eq!(expr, "\"re fund\"");
    }

    #[test]
    fn match_expression_empty_keywords() {
        assert!(build_match_expression(&[]).is_none());
        assert!(build_match_expression(&["\"".to_string()]).is_none());
    }

    #[test]
    fn metadata_extraction() {
        let source = Uuid::new_v4();
        let mut metadata = HashMap::new();
        metadata.insert("sourceId".to_string(), serde_json::json!(source));
        metadata.insert("chunkIndex".to_string(), serde_json::json!(4));
        metadata.insert("fileName".to_string(), serde_json::json!("handbook.pdf"));

        let hit = VectorHit::from(VectorQueryResult {
            id: "c1".to_string(),
            score: 0.8,
            metadata,
        });

        assert_eq!(hit.source_id, Some(source));
        assert_eq!(hit.chunk_index, Some(4));
        assert_eq!(hit.file_name.as_deref(), Some("handbook.pdf"));
    }
}
