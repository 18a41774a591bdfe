//! Transcript and run metric models for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::{run_metrics, transcripts};

/// One persisted LLM turn.
///
/// The request payload is a tagged JSON record that includes the full
/// retrieval debug record; unknown fields round-trip through the raw JSON.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = transcripts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Transcript {
    /// Unique transcript identifier.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Conversation grouping id.
    pub conversation_id: Uuid,
    /// Unique run id of the turn.
    pub run_id: Uuid,
    /// Request payload, including the retrieval debug record.
    pub request: serde_json::Value,
    /// Full response text.
    pub response_text: String,
    /// Token usage (JSON).
    pub usage: serde_json::Value,
    /// End-to-end latency in milliseconds.
    pub latency_ms: i32,
    /// Timestamp when the transcript was created.
    pub created_at: Timestamp,
}

/// Data for creating a new transcript.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = transcripts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewTranscript {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Conversation grouping id.
    pub conversation_id: Uuid,
    /// Unique run id.
    pub run_id: Uuid,
    /// Request payload.
    pub request: serde_json::Value,
    /// Response text.
    pub response_text: String,
    /// Token usage.
    pub usage: serde_json::Value,
    /// Latency in milliseconds.
    pub latency_ms: i32,
}

/// Per-turn cost and latency aggregates.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = run_metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RunMetric {
    /// Unique metric identifier.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Run id of the turn.
    pub run_id: Uuid,
    /// Model alias used for the turn.
    pub model_alias: String,
    /// Input tokens.
    pub input_tokens: i32,
    /// Output tokens.
    pub output_tokens: i32,
    /// Estimated cost in USD.
    pub cost_usd: f64,
    /// Retrieval latency in milliseconds.
    pub retrieval_ms: i32,
    /// Total turn latency in milliseconds.
    pub total_ms: i32,
    /// Error kind, when the turn failed.
    pub error_kind: Option<String>,
    /// Timestamp when the metric was created.
    pub created_at: Timestamp,
}

/// Data for creating a new run metric.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = run_metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewRunMetric {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Run id.
    pub run_id: Uuid,
    /// Model alias.
    pub model_alias: String,
    /// Input tokens.
    pub input_tokens: i32,
    /// Output tokens.
    pub output_tokens: i32,
    /// Estimated cost in USD.
    pub cost_usd: f64,
    /// Retrieval latency in milliseconds.
    pub retrieval_ms: i32,
    /// Total latency in milliseconds.
    pub total_ms: i32,
    /// Error kind, when the turn failed.
    pub error_kind: Option<String>,
}
