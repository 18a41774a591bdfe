//! Agent model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::agents;
use crate::types::{AgentStatus, AgentVisibility};

/// Agent model representing a configured assistant.
///
/// An agent owns its prompts, knowledge sources, chat images, and model
/// policy timeline. The flattened `retrieval_*` columns are the per-agent
/// retrieval defaults merged with per-request overrides at chat time.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Agent {
    /// Unique agent identifier.
    pub id: Uuid,
    /// URL-safe unique slug.
    pub slug: String,
    /// Human-readable name.
    pub display_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status; only active agents serve chat turns.
    pub status: AgentStatus,
    /// Visibility to end users.
    pub visibility: AgentVisibility,
    /// Master switch for retrieval.
    pub retrieval_enabled: bool,
    /// Bypass the intent gate.
    pub retrieval_skip_intent: bool,
    /// Expand the query into variations.
    pub retrieval_rewrite: bool,
    /// Cross-encoder rerank of fused candidates.
    pub retrieval_rerank: bool,
    /// Final number of chunks returned.
    pub retrieval_top_k: i32,
    /// Floor on dense similarity in [0, 1].
    pub retrieval_min_similarity: f64,
    /// Target number of query rewrites (1-10).
    pub retrieval_query_variations: i32,
    /// Model override for query rewriting.
    pub rewrite_model: Option<String>,
    /// Model override for intent classification.
    pub intent_model: Option<String>,
    /// Model override for reranking.
    pub rerank_model: Option<String>,
    /// Model override for embeddings.
    pub embedding_model: Option<String>,
    /// Restrict answers to retrieved context.
    pub guardrail_context_only: bool,
    /// Timestamp when the agent was created.
    pub created_at: Timestamp,
    /// Timestamp when the agent was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new agent.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAgent {
    /// URL-safe unique slug (required).
    pub slug: String,
    /// Human-readable name (required).
    pub display_name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lifecycle status.
    pub status: AgentStatus,
    /// Visibility.
    pub visibility: AgentVisibility,
}

/// Data for updating an agent.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateAgent {
    /// New display name.
    pub display_name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New status.
    pub status: Option<AgentStatus>,
    /// New visibility.
    pub visibility: Option<AgentVisibility>,
    /// New retrieval master switch.
    pub retrieval_enabled: Option<bool>,
    /// New intent-gate bypass.
    pub retrieval_skip_intent: Option<bool>,
    /// New rewrite switch.
    pub retrieval_rewrite: Option<bool>,
    /// New rerank switch.
    pub retrieval_rerank: Option<bool>,
    /// New top-k.
    pub retrieval_top_k: Option<i32>,
    /// New similarity floor.
    pub retrieval_min_similarity: Option<f64>,
    /// New variation count.
    pub retrieval_query_variations: Option<i32>,
    /// New guardrail flag.
    pub guardrail_context_only: Option<bool>,
}

/// The agent's retrieval defaults, extracted for config merging.
#[derive(Debug, Clone)]
pub struct RetrievalDefaults {
    /// Master switch.
    pub enabled: bool,
    /// Bypass the intent gate.
    pub skip_intent: bool,
    /// Query rewrite switch.
    pub rewrite: bool,
    /// Rerank switch.
    pub rerank: bool,
    /// Final chunk count.
    pub top_k: u32,
    /// Similarity floor.
    pub min_similarity: f64,
    /// Rewrite variation target.
    pub query_variations: u32,
    /// Model overrides.
    pub rewrite_model: Option<String>,
    /// Intent model override.
    pub intent_model: Option<String>,
    /// Rerank model override.
    pub rerank_model: Option<String>,
    /// Embedding model override.
    pub embedding_model: Option<String>,
}

impl Agent {
    /// Returns whether the agent may serve chat turns.
    pub fn can_serve(&self) -> bool {
        self.status.can_serve()
    }

    /// Extracts the retrieval defaults from the flattened columns.
    pub fn retrieval_defaults(&self) -> RetrievalDefaults {
        RetrievalDefaults {
            enabled: self.retrieval_enabled,
            skip_intent: self.retrieval_skip_intent,
            rewrite: self.retrieval_rewrite,
            rerank: self.retrieval_rerank,
            top_k: self.retrieval_top_k.max(1) as u32,
            min_similarity: self.retrieval_min_similarity,
            query_variations: self.retrieval_query_variations.clamp(1, 10) as u32,
            rewrite_model: self.rewrite_model.clone(),
            intent_model: self.intent_model.clone(),
            rerank_model: self.rerank_model.clone(),
            embedding_model: self.embedding_model.clone(),
        }
    }
}
