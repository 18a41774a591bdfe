//! Retrieval configuration.

use std::time::Duration;

use plinth_inference::ModelRef;

/// Conversational query reformulation tunables.
#[derive(Debug, Clone)]
pub struct CqrConfig {
    /// How many trailing history messages to include.
    pub history_messages: usize,
    /// Per-message truncation in characters.
    pub history_message_chars: usize,
    /// Rewrites longer than `ratio × original` are rejected.
    pub max_expansion_ratio: f64,
    /// Rewrites longer than this absolute cap are rejected.
    pub max_rewritten_chars: usize,
    /// Hard timeout for the reformulation call.
    pub timeout: Duration,
}

impl Default for CqrConfig {
    fn default() -> Self {
        Self {
            history_messages: 5,
            history_message_chars: 200,
            max_expansion_ratio: 3.0,
            max_rewritten_chars: 512,
            timeout: Duration::from_secs(2),
        }
    }
}

/// Configuration for one retrieval run.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Master switch; when false, retrieval returns null context immediately.
    pub enabled: bool,
    /// Bypass the intent gate.
    pub skip_intent: bool,
    /// Expand the query into variations.
    pub rewrite: bool,
    /// Cross-encoder rerank of fused candidates.
    pub rerank: bool,
    /// Final number of chunks returned.
    pub top_k: u32,
    /// Floor on dense similarity in [0, 1].
    pub min_similarity: f64,
    /// Target number of query rewrites (1-10).
    pub query_variations: u32,
    /// Model override for query reformulation and rewriting.
    pub rewrite_model: Option<ModelRef>,
    /// Model override for intent classification.
    pub intent_model: Option<ModelRef>,
    /// Model override for reranking.
    pub rerank_model: Option<ModelRef>,
    /// Model override for embeddings.
    pub embedding_model: Option<ModelRef>,
    /// Reserved indexing-side feature flag.
    pub contextual_embeddings_enabled: bool,
    /// Query reformulation tunables.
    pub cqr: CqrConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            skip_intent: false,
            rewrite: true,
            rerank: false,
            top_k: 5,
            min_similarity: 0.3,
            query_variations: 3,
            rewrite_model: None,
            intent_model: None,
            rerank_model: None,
            embedding_model: None,
            contextual_embeddings_enabled: false,
            cqr: CqrConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Returns `top_k` clamped to a sane range.
    pub fn top_k(&self) -> usize {
        self.top_k.clamp(1, 50) as usize
    }

    /// Returns the variation count clamped to 1-10.
    pub fn query_variations(&self) -> usize {
        self.query_variations.clamp(1, 10) as usize
    }

    /// Per-subquery result count: `ceil(top_k / variation_count)`.
    pub fn per_query_k(&self) -> usize {
        self.top_k().div_ceil(self.query_variations()).max(1)
    }
}

/// Per-request overrides merged over an agent's defaults.
#[derive(Debug, Clone, Default)]
pub struct RetrievalOverrides {
    /// Override the master switch.
    pub enabled: Option<bool>,
    /// Override intent gating.
    pub skip_intent: Option<bool>,
    /// Override query rewriting.
    pub rewrite: Option<bool>,
    /// Override reranking.
    pub rerank: Option<bool>,
    /// Override the final chunk count.
    pub top_k: Option<u32>,
    /// Override the similarity floor.
    pub min_similarity: Option<f64>,
    /// Override the variation count.
    pub query_variations: Option<u32>,
}

impl RetrievalConfig {
    /// Applies per-request overrides, returning the merged configuration.
    pub fn with_overrides(mut self, overrides: &RetrievalOverrides) -> Self {
        if let Some(enabled) = overrides.enabled {
            self.enabled = enabled;
        }
        if let Some(skip_intent) = overrides.skip_intent {
            self.skip_intent = skip_intent;
        }
        if let Some(rewrite) = overrides.rewrite {
            self.rewrite = rewrite;
        }
        if let Some(rerank) = overrides.rerank {
            self.rerank = rerank;
        }
        if let Some(top_k) = overrides.top_k {
            self.top_k = top_k;
        }
        if let Some(min_similarity) = overrides.min_similarity {
            self.min_similarity = min_similarity;
        }
        if let Some(query_variations) = overrides.query_variations {
            self.query_variations = query_variations;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_query_k_is_ceiling() {
        let config = RetrievalConfig {
            top_k: 5,
            query_variations: 3,
            ..Default::default()
        };
        assert_eq!(config.per_query_k(), 2);

        let config = RetrievalConfig {
            top_k: 10,
            query_variations: 10,
            ..Default::default()
        };
        assert_eq!(config.per_query_k(), 1);
    }

    #[test]
    fn overrides_merge() {
        let merged = RetrievalConfig::default().with_overrides(&RetrievalOverrides {
            rerank: Some(true),
            top_k: Some(8),
            ..Default::default()
        });

        assert!(merged.rerank);
        assert_eq!(merged.top_k, 8);
        // Untouched fields keep their defaults.
        assert!(merged.enabled);
        assert_eq!(merged.query_variations, 3);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let config = RetrievalConfig {
            top_k: 0,
            query_variations: 99,
            ..Default::default()
        };
        assert_eq!(config.top_k(), 1);
        assert_eq!(config.query_variations(), 10);
    }
}
