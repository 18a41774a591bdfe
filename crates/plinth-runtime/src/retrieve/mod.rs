//! Retrieval pipeline: user turn → ranked, enriched context.
//!
//! Stages: conversational query reformulation, intent gating, query
//! rewriting (concurrent with intent), hybrid vector + full-text search,
//! reciprocal rank fusion, optional cross-encoder reranking, neighbor
//! expansion, and enrichment. No stage surfaces an error to the caller:
//! every stage has an explicit degraded path and records what happened in
//! the debug record.

mod config;
mod cqr;
mod debug;
mod fusion;
mod hybrid;
mod intent;
mod neighbors;
mod rewrite;
mod types;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use plinth_core::StageTimer;
use plinth_postgres::PgClient;
use plinth_postgres::query::DocumentChunkRepository;
use plinth_inference::{ModelRef, ProviderRegistry};
use plinth_vector::VectorIndex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use config::{CqrConfig, RetrievalConfig, RetrievalOverrides};
pub use debug::{ChunkScore, RetrievalDebug, SkipReason, StageModels, StageTimings};
pub use types::{ChatTurn, RetrievalResult, RetrievedChunk, TurnRole};

use crate::TRACING_TARGET;
use crate::error::RuntimeResult;

/// Default model references used when the configuration has no override.
#[derive(Debug, Clone)]
pub struct RetrieverDefaults {
    /// Small model for reformulation, intent, and rewriting.
    pub utility_model: ModelRef,
    /// Cross-encoder rerank model.
    pub rerank_model: ModelRef,
    /// Embedding model.
    pub embedding_model: ModelRef,
}

/// Retrieval pipeline service.
#[derive(Clone)]
pub struct Retriever {
    inner: Arc<RetrieverInner>,
}

struct RetrieverInner {
    db: PgClient,
    vectors: Arc<VectorIndex>,
    registry: Arc<ProviderRegistry>,
    defaults: RetrieverDefaults,
}

/// Internal candidate accumulated across stages.
#[derive(Debug, Clone)]
struct Candidate {
    id: String,
    source_id: Option<Uuid>,
    chunk_index: Option<i32>,
    content: String,
    score: f64,
    vector_score: Option<f64>,
    rerank_score: Option<f64>,
    file_name: Option<String>,
}

impl Retriever {
    /// Creates a new retriever.
    pub fn new(
        db: PgClient,
        vectors: Arc<VectorIndex>,
        registry: Arc<ProviderRegistry>,
        defaults: RetrieverDefaults,
    ) -> Self {
        Self {
            inner: Arc::new(RetrieverInner {
                db,
                vectors,
                registry,
                defaults,
            }),
        }
    }

    /// Runs the full pipeline for one user turn.
    ///
    /// Never fails: degraded stages record warnings in the returned debug
    /// record, and a pipeline-level failure returns null context.
    pub async fn retrieve(
        &self,
        agent_id: Uuid,
        user_query: &str,
        history: &[ChatTurn],
        config: &RetrievalConfig,
        cancel: &CancellationToken,
    ) -> RetrievalResult {
        let mut debug = RetrievalDebug::default();
        let total_timer = StageTimer::start();

        if !config.enabled {
            debug.skip_reason = Some(SkipReason::Config);
            debug.total_rag_ms = total_timer.total();
            return RetrievalResult::empty(debug);
        }

        let query = user_query.trim();
        if query.is_empty() {
            debug.warn("empty query; retrieval skipped");
            debug.total_rag_ms = total_timer.total();
            return RetrievalResult::empty(debug);
        }

        let context = match self
            .run(agent_id, query, history, config, cancel, &mut debug)
            .await
        {
            Ok(context) => context,
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    agent_id = %agent_id,
                    error = %error,
                    "Retrieval degraded to null context"
                );
                debug.warn(format!("retrieval degraded: {error}"));
                None
            }
        };

        debug.total_rag_ms = total_timer.total();
        RetrievalResult { context, debug }
    }

    async fn run(
        &self,
        agent_id: Uuid,
        query: &str,
        history: &[ChatTurn],
        config: &RetrievalConfig,
        cancel: &CancellationToken,
        debug: &mut RetrievalDebug,
    ) -> RuntimeResult<Option<Vec<RetrievedChunk>>> {
        let defaults = &self.inner.defaults;
        let utility_ref = config
            .rewrite_model
            .clone()
            .unwrap_or_else(|| defaults.utility_model.clone());
        let intent_ref = config
            .intent_model
            .clone()
            .unwrap_or_else(|| defaults.utility_model.clone());
        let embedding_ref = config
            .embedding_model
            .clone()
            .unwrap_or_else(|| defaults.embedding_model.clone());

        debug.models.rewrite = Some(utility_ref.to_string());
        debug.models.intent = Some(intent_ref.to_string());
        debug.models.embedding = Some(embedding_ref.to_string());

        let utility = self.inner.registry.completion(&utility_ref)?;
        let intent_provider = self.inner.registry.completion(&intent_ref)?;
        let embeddings = self.inner.registry.embedding(&embedding_ref)?;

        let mut stage_timer = StageTimer::start();

        // Stage 0: conversational query reformulation (sequential).
        let cqr_outcome = cqr::reformulate(&utility, query, history, &config.cqr, cancel).await;
        debug.cqr_applied = cqr_outcome.applied;
        debug.effective_query = Some(cqr_outcome.effective_query.clone());
        debug.timings.cqr_ms = Some(stage_timer.lap());

        let effective = cqr_outcome.effective_query;

        // Stages 1 and 2: intent gate and query rewrite run concurrently;
        // rewrite output is discarded if intent says no.
        let intent_future = async {
            if config.skip_intent {
                None
            } else {
                Some(intent::classify(&intent_provider, &effective, cancel).await)
            }
        };
        let rewrite_future = async {
            if config.rewrite {
                rewrite::expand(&utility, &effective, config.query_variations(), cancel).await
            } else {
                rewrite::fallback(&effective)
            }
        };

        let ((intent_outcome, intent_ms), (rewrite_outcome, rewrite_ms)) =
            tokio::join!(timed(intent_future), timed(rewrite_future));

        if !config.skip_intent {
            debug.timings.intent_ms = Some(intent_ms);
        }
        if config.rewrite {
            debug.timings.rewrite_ms = Some(rewrite_ms);
        }

        if let Some(outcome) = intent_outcome {
            debug.intent_reason = Some(outcome.reason);
            if !outcome.requires_rag {
                debug.skip_reason = Some(SkipReason::Intent);
                stage_timer.lap();
                return Ok(None);
            }
        }

        debug.query_variations = rewrite_outcome.variations.clone();
        debug.keywords = rewrite_outcome.keywords.clone();
        stage_timer.lap();

        // Stage 3: hybrid search. Vector fan-out and FTS run concurrently;
        // FTS failure degrades to vector-only.
        let mut conn = self.inner.db.get_connection().await?;
        let namespace = agent_id.to_string();
        let variation_count = rewrite_outcome.variations.len().max(1);
        let per_query_k = config.top_k().div_ceil(variation_count).max(1);

        let (vector_outcome, (fts_hits, fts_warning)) = tokio::join!(
            hybrid::vector_stage(
                &embeddings,
                &self.inner.vectors,
                &namespace,
                &rewrite_outcome.variations,
                per_query_k,
                config.min_similarity,
                cancel,
            ),
            hybrid::fts_stage(&mut conn, agent_id, &rewrite_outcome.keywords, per_query_k),
        );

        for warning in vector_outcome.warnings {
            debug.warn(warning);
        }
        if let Some(warning) = fts_warning {
            debug.warn(warning);
        }

        debug.vector_results_count = vector_outcome.result_sets.iter().map(Vec::len).sum();
        debug.fts_results_count = fts_hits.len();
        debug.timings.search_ms = Some(stage_timer.lap());

        // Assemble candidates and the per-set id lists for fusion.
        let mut candidates: HashMap<String, Candidate> = HashMap::new();
        let mut id_sets: Vec<Vec<String>> = Vec::new();

        for set in &vector_outcome.result_sets {
            let mut ids = Vec::with_capacity(set.len());
            for hit in set {
                ids.push(hit.id.clone());
                let entry = candidates.entry(hit.id.clone()).or_insert_with(|| Candidate {
                    id: hit.id.clone(),
                    source_id: hit.source_id,
                    chunk_index: hit.chunk_index,
                    content: String::new(),
                    score: 0.0,
                    vector_score: Some(hit.score as f64),
                    rerank_score: None,
                    file_name: hit.file_name.clone(),
                });
                let score = hit.score as f64;
                if entry.vector_score.is_none_or(|s| score > s) {
                    entry.vector_score = Some(score);
                }
            }
            id_sets.push(ids);
        }

        let mut fts_ids = Vec::with_capacity(fts_hits.len());
        for hit in &fts_hits {
            let id = hit.id.to_string();
            fts_ids.push(id.clone());
            candidates.entry(id.clone()).or_insert_with(|| Candidate {
                id,
                source_id: Some(hit.source_id),
                chunk_index: Some(hit.chunk_index),
                content: hit.content.clone(),
                score: 0.0,
                vector_score: None,
                rerank_score: None,
                file_name: None,
            });
        }
        if !fts_ids.is_empty() {
            id_sets.push(fts_ids);
        }

        // Stage 4: reciprocal rank fusion; top 2 × top_k go forward.
        let top_k = config.top_k();
        let fused = fusion::reciprocal_rank_fusion(&id_sets);

        let mut shortlist: Vec<Candidate> = fused
            .into_iter()
            .take(2 * top_k)
            .filter_map(|(id, score)| {
                candidates.remove(&id).map(|mut candidate| {
                    candidate.score = score;
                    candidate
                })
            })
            .collect();

        debug.fused_candidates_count = shortlist.len();
        debug.timings.fusion_ms = Some(stage_timer.lap());

        if shortlist.is_empty() {
            return Ok(None);
        }

        // Hydrate candidate texts from the relational store; vector metadata
        // never carries chunk text.
        self.hydrate(&mut conn, &mut shortlist, debug).await;

        // Stage 5: optional cross-encoder rerank; failure keeps fused order.
        if config.rerank {
            let rerank_ref = config
                .rerank_model
                .clone()
                .unwrap_or_else(|| defaults.rerank_model.clone());
            debug.models.rerank = Some(rerank_ref.to_string());

            shortlist = self
                .rerank_stage(&rerank_ref, &effective, shortlist, top_k, cancel, debug)
                .await;
            debug.timings.rerank_ms = Some(stage_timer.lap());
        } else {
            shortlist.truncate(top_k);
        }

        // Stage 6: neighbor expansion, one batched query.
        self.expand_neighbors(&mut conn, &mut shortlist, top_k, debug)
            .await;
        debug.timings.neighbors_ms = Some(stage_timer.lap());

        // Stage 7: enrichment with authoritative text and file names.
        self.enrich(&mut conn, &mut shortlist, debug).await;
        debug.timings.enrich_ms = Some(stage_timer.lap());

        shortlist.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

        debug.final_scores = shortlist
            .iter()
            .map(|c| ChunkScore {
                chunk_id: c.id.clone(),
                score: c.score,
                vector_score: c.vector_score,
                rerank_score: c.rerank_score,
            })
            .collect();

        let chunks: Vec<RetrievedChunk> = shortlist
            .into_iter()
            .map(|c| RetrievedChunk {
                chunk_id: c.id,
                source_id: c.source_id,
                chunk_index: c.chunk_index,
                content: c.content,
                score: c.score,
                vector_score: c.vector_score,
                rerank_score: c.rerank_score,
                file_name: c.file_name,
            })
            .collect();

        if chunks.is_empty() {
            return Ok(None);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            agent_id = %agent_id,
            chunks = chunks.len(),
            "Retrieval complete"
        );

        Ok(Some(chunks))
    }

    /// Loads authoritative chunk text for candidates that arrived without
    /// content. Degrades to whatever content is present.
    async fn hydrate(
        &self,
        conn: &mut plinth_postgres::PgConnection,
        shortlist: &mut [Candidate],
        debug: &mut RetrievalDebug,
    ) {
        let missing: Vec<Uuid> = shortlist
            .iter()
            .filter(|c| c.content.is_empty())
            .filter_map(|c| Uuid::parse_str(&c.id).ok())
            .collect();

        if missing.is_empty() {
            return;
        }

        match conn.find_chunks_with_sources(&missing).await {
            Ok(rows) => {
                let by_id: HashMap<String, _> = rows
                    .into_iter()
                    .map(|row| (row.chunk.id.to_string(), row))
                    .collect();

                for candidate in shortlist.iter_mut() {
                    if let Some(row) = by_id.get(&candidate.id) {
                        if candidate.content.is_empty() {
                            candidate.content = row.chunk.content.clone();
                        }
                        candidate.source_id = Some(row.chunk.source_id);
                        candidate.chunk_index = Some(row.chunk.chunk_index);
                        candidate.file_name = Some(row.file_name.clone());
                    }
                }
            }
            Err(error) => {
                debug.warn(format!("candidate hydration failed: {error}"));
            }
        }
    }

    /// Reranks the shortlist; preserves each candidate's dense similarity
    /// as `vector_score` alongside the new `rerank_score`.
    async fn rerank_stage(
        &self,
        rerank_ref: &ModelRef,
        query: &str,
        shortlist: Vec<Candidate>,
        top_k: usize,
        cancel: &CancellationToken,
        debug: &mut RetrievalDebug,
    ) -> Vec<Candidate> {
        let provider = match self.inner.registry.rerank(rerank_ref) {
            Ok(provider) => provider,
            Err(error) => {
                debug.warn(format!("rerank unavailable: {error}"));
                let mut fallback = shortlist;
                fallback.truncate(top_k);
                return fallback;
            }
        };

        let texts: Vec<String> = shortlist.iter().map(|c| c.content.clone()).collect();

        match provider.rerank(query, &texts, top_k, cancel).await {
            Ok(hits) => {
                debug.reranked = true;
                hits.into_iter()
                    .filter_map(|hit| {
                        shortlist.get(hit.index).cloned().map(|mut candidate| {
                            candidate.rerank_score = Some(hit.score);
                            candidate.score = hit.score;
                            candidate
                        })
                    })
                    .collect()
            }
            Err(error) => {
                debug.warn(format!("rerank failed: {error}"));
                let mut fallback = shortlist;
                fallback.truncate(top_k);
                fallback
            }
        }
    }

    /// Fetches `chunk_index ± 1` neighbors with a single batched query and
    /// merges them at a discounted score, deduplicated by chunk id and
    /// capped at `max(2 × top_k, top_k + 2)`.
    async fn expand_neighbors(
        &self,
        conn: &mut plinth_postgres::PgConnection,
        shortlist: &mut Vec<Candidate>,
        top_k: usize,
        debug: &mut RetrievalDebug,
    ) {
        let present: HashSet<(Uuid, i32)> = shortlist
            .iter()
            .filter_map(|c| Some((c.source_id?, c.chunk_index?)))
            .collect();

        let base: Vec<(Uuid, i32)> = present.iter().copied().collect();
        let plan = neighbors::plan_neighbors(&base, &present);
        if plan.wanted.is_empty() {
            return;
        }

        // Discounted score per wanted position, from the best base chunk
        // that requested it.
        let mut neighbor_scores: HashMap<(Uuid, i32), f64> = HashMap::new();
        for candidate in shortlist.iter() {
            let (Some(source_id), Some(chunk_index)) = (candidate.source_id, candidate.chunk_index)
            else {
                continue;
            };
            for offset in [-1i32, 1] {
                let pair = (source_id, chunk_index + offset);
                if plan.wanted.contains(&pair) {
                    let discounted = candidate.score * neighbors::NEIGHBOR_SCORE_FACTOR;
                    neighbor_scores
                        .entry(pair)
                        .and_modify(|s| *s = s.max(discounted))
                        .or_insert(discounted);
                }
            }
        }

        let rows = match conn
            .find_neighbor_chunks(&plan.source_ids, &plan.chunk_indices)
            .await
        {
            Ok(rows) => rows,
            Err(error) => {
                debug.warn(format!("neighbor expansion failed: {error}"));
                return;
            }
        };

        let existing_ids: HashSet<String> = shortlist.iter().map(|c| c.id.clone()).collect();
        let cap = neighbors::expansion_cap(top_k);

        for row in rows {
            if shortlist.len() >= cap {
                break;
            }
            let pair = (row.source_id, row.chunk_index);
            if !plan.wanted.contains(&pair) {
                continue;
            }
            let id = row.id.to_string();
            if existing_ids.contains(&id) {
                continue;
            }

            let score = neighbor_scores.get(&pair).copied().unwrap_or(0.0);
            shortlist.push(Candidate {
                id,
                source_id: Some(row.source_id),
                chunk_index: Some(row.chunk_index),
                content: row.content,
                score,
                vector_score: None,
                rerank_score: None,
                file_name: None,
            });
        }
    }

    /// Joins the final candidates to the relational store in one query,
    /// replacing shorter content with the authoritative chunk text and
    /// attaching the owning source's file name.
    async fn enrich(
        &self,
        conn: &mut plinth_postgres::PgConnection,
        shortlist: &mut [Candidate],
        debug: &mut RetrievalDebug,
    ) {
        let ids: Vec<Uuid> = shortlist
            .iter()
            .filter_map(|c| Uuid::parse_str(&c.id).ok())
            .collect();

        if ids.is_empty() {
            return;
        }

        match conn.find_chunks_with_sources(&ids).await {
            Ok(rows) => {
                let by_id: HashMap<String, _> = rows
                    .into_iter()
                    .map(|row| (row.chunk.id.to_string(), row))
                    .collect();

                for candidate in shortlist.iter_mut() {
                    let Some(row) = by_id.get(&candidate.id) else {
                        continue;
                    };
                    // Authoritative text wins unless it is shorter than what
                    // the candidate already carries.
                    if row.chunk.content.len() >= candidate.content.len() {
                        candidate.content = row.chunk.content.clone();
                    }
                    candidate.source_id = Some(row.chunk.source_id);
                    candidate.chunk_index = Some(row.chunk.chunk_index);
                    candidate.file_name = Some(row.file_name.clone());
                }
            }
            Err(error) => {
                debug.warn(format!("enrichment failed: {error}"));
            }
        }
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("defaults", &self.inner.defaults)
            .finish_non_exhaustive()
    }
}

/// Awaits a future and reports its wall-clock duration in milliseconds.
async fn timed<F: Future>(future: F) -> (F::Output, u64) {
    let start = jiff::Timestamp::now();
    let output = future.await;
    let elapsed = jiff::Timestamp::now()
        .duration_since(start)
        .as_millis()
        .max(0) as u64;
    (output, elapsed)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use plinth_postgres::PgConfig;
    use plinth_inference::provider::Provider;
    use plinth_vector::{
        QdrantConfig, QueryOptions, VectorIndexBackend, VectorIndexConfig, VectorQueryResult,
        VectorRecord, VectorResult,
    };

    use super::*;

    struct UnreachableBackend;

    #[async_trait]
    impl VectorIndexBackend for UnreachableBackend {
        async fn upsert(&self, _ns: &str, _records: Vec<VectorRecord>) -> VectorResult<()> {
            panic!("vector index must not be touched");
        }

        async fn query(
            &self,
            _ns: &str,
            _vector: Vec<f32>,
            _limit: usize,
            _options: QueryOptions,
        ) -> VectorResult<Vec<VectorQueryResult>> {
            panic!("vector index must not be touched");
        }

        async fn delete(&self, _ns: &str, _ids: Vec<String>) -> VectorResult<()> {
            panic!("vector index must not be touched");
        }

        async fn delete_namespace(&self, _ns: &str) -> VectorResult<()> {
            panic!("vector index must not be touched");
        }
    }

    fn test_retriever() -> Retriever {
        let db = PgClient::new(PgConfig::new("postgresql://localhost/plinth_test"))
            .expect("pool construction is lazy");

        let vectors = Arc::new(VectorIndex::from_backend(
            VectorIndexConfig::Qdrant(QdrantConfig {
                url: "http://localhost:6334".to_string(),
                api_key: None,
                collection_prefix: "test".to_string(),
            }),
            4,
            Box::new(UnreachableBackend),
        ));

        let registry = Arc::new(ProviderRegistry::new(
            HashMap::new(),
            "http://localhost:11434/v1",
            None,
            4,
        ));

        let utility = ModelRef::new(Provider::Local, "qwen2.5:3b");
        Retriever::new(
            db,
            vectors,
            registry,
            RetrieverDefaults {
                utility_model: utility.clone(),
                rerank_model: ModelRef::new(Provider::Local, "bge-reranker"),
                embedding_model: ModelRef::new(Provider::Local, "nomic-embed-text"),
            },
        )
    }

    #[tokio::test]
    async fn disabled_config_returns_null_context_without_any_calls() {
        let retriever = test_retriever();
        let config = RetrievalConfig {
            enabled: false,
            ..Default::default()
        };

        let result = retriever
            .retrieve(
                Uuid::new_v4(),
                "What is our refund policy?",
                &[],
                &config,
                &CancellationToken::new(),
            )
            .await;

        assert!(result.context.is_none());
        assert_eq!(result.debug.skip_reason, Some(SkipReason::Config));
        assert!(result.debug.warnings.is_empty());
    }

    #[tokio::test]
    async fn empty_query_returns_null_context() {
        let retriever = test_retriever();

        let result = retriever
            .retrieve(
                Uuid::new_v4(),
                "   ",
                &[],
                &RetrievalConfig::default(),
                &CancellationToken::new(),
            )
            .await;

        assert!(result.context.is_none());
        assert!(!result.debug.warnings.is_empty());
    }
}
