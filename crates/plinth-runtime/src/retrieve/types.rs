//! Retrieval input and output types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::debug::RetrievalDebug;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// End-user turn.
    User,
    /// Assistant turn.
    Assistant,
}

/// One turn of recent conversation history, used by query reformulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who spoke.
    pub role: TurnRole,
    /// What was said.
    pub content: String,
}

impl ChatTurn {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// A chunk surfaced by retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk id (vector id).
    pub chunk_id: String,
    /// Owning knowledge source, when known.
    pub source_id: Option<Uuid>,
    /// Index within the source, when known.
    pub chunk_index: Option<i32>,
    /// Chunk text.
    pub content: String,
    /// Final ranking score.
    pub score: f64,
    /// Dense similarity before reranking, when the chunk came from vector
    /// search.
    pub vector_score: Option<f64>,
    /// Cross-encoder score, when reranking ran.
    pub rerank_score: Option<f64>,
    /// File name of the owning source, attached during enrichment.
    pub file_name: Option<String>,
}

/// Result of one retrieval run.
///
/// `context` is `None` when retrieval was skipped or produced no hits; the
/// debug record is populated either way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Retrieved context, highest score first.
    pub context: Option<Vec<RetrievedChunk>>,
    /// Per-stage debug record.
    pub debug: RetrievalDebug,
}

impl RetrievalResult {
    /// Creates an empty result carrying only the debug record.
    pub fn empty(debug: RetrievalDebug) -> Self {
        Self {
            context: None,
            debug,
        }
    }
}
