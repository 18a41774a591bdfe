//! Retrieval debug record.

use serde::{Deserialize, Serialize};

/// Why retrieval was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    /// The master switch disabled retrieval.
    Config,
    /// The intent gate classified the turn as non-informational.
    Intent,
}

/// Millisecond durations per pipeline stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageTimings {
    /// Conversational query reformulation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cqr_ms: Option<u64>,
    /// Intent classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_ms: Option<u64>,
    /// Query rewriting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite_ms: Option<u64>,
    /// Hybrid search (vector fan-out and FTS).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_ms: Option<u64>,
    /// Rank fusion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fusion_ms: Option<u64>,
    /// Cross-encoder rerank.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_ms: Option<u64>,
    /// Neighbor expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbors_ms: Option<u64>,
    /// Enrichment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrich_ms: Option<u64>,
}

/// Model identifiers used at each stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageModels {
    /// Model used for query reformulation and rewriting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
    /// Model used for intent classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Model used for embeddings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
    /// Model used for reranking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank: Option<String>,
}

/// Final score of one returned chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkScore {
    /// Chunk id.
    pub chunk_id: String,
    /// Final ranking score.
    pub score: f64,
    /// Dense similarity, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vector_score: Option<f64>,
    /// Cross-encoder score, when reranking ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rerank_score: Option<f64>,
}

/// Debug record for one retrieval run.
///
/// Persisted inside the transcript's request payload; every stage records
/// its duration and the models it used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalDebug {
    /// Why retrieval was skipped, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    /// The intent gate's reason string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_reason: Option<String>,
    /// Whether query reformulation changed the query.
    pub cqr_applied: bool,
    /// The query all later stages ran with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_query: Option<String>,
    /// Query variations used by hybrid search.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_variations: Vec<String>,
    /// Keywords used by full-text search.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Accepted dense matches across all subqueries.
    pub vector_results_count: usize,
    /// Full-text hits.
    pub fts_results_count: usize,
    /// Candidates after rank fusion.
    pub fused_candidates_count: usize,
    /// Whether reranking ran.
    pub reranked: bool,
    /// Degradation warnings accumulated along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Per-stage millisecond durations.
    pub timings: StageTimings,
    /// Model identifiers per stage.
    pub models: StageModels,
    /// Final chunk scores.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub final_scores: Vec<ChunkScore>,
    /// Total pipeline duration.
    pub total_rag_ms: u64,
}

impl RetrievalDebug {
    /// Appends a degradation warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_compactly() {
        let debug = RetrievalDebug::default();
        let json = serde_json::to_value(&debug).unwrap();

        // Empty collections and unset options are omitted.
        assert!(json.get("warnings").is_none());
        assert!(json.get("skip_reason").is_none());
        assert!(json.get("query_variations").is_none());
    }

    #[test]
    fn skip_reason_round_trips() {
        let mut debug = RetrievalDebug::default();
        debug.skip_reason = Some(SkipReason::Intent);

        let json = serde_json::to_string(&debug).unwrap();
        let back: RetrievalDebug = serde_json::from_str(&json).unwrap();
        assert_eq!(back.skip_reason, Some(SkipReason::Intent));
    }
}
