//! Knowledge source model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::knowledge_sources;
use crate::types::SourceStatus;

/// An agent-scoped uploaded knowledge artifact.
///
/// Tracks the original file, its ingestion status, the errors of the last
/// failed run, and the ids of the vectors it owns in the vector index.
/// Deleting a source cascades to its chunks; the owning pipeline deletes the
/// vectors by id.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = knowledge_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct KnowledgeSource {
    /// Unique source identifier.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Original file name.
    pub file_name: String,
    /// MIME type as declared at upload.
    pub mime_type: String,
    /// File size in bytes.
    pub byte_size: i64,
    /// Object-store key of the uploaded bytes.
    pub storage_key: String,
    /// SHA-256 checksum of the uploaded bytes (hex).
    pub checksum: Option<String>,
    /// Ingestion lifecycle status.
    pub status: SourceStatus,
    /// Error messages from failed ingestion runs.
    pub error_messages: Vec<String>,
    /// Ids of the vectors this source owns in the vector index.
    pub vector_ids: Vec<String>,
    /// Number of chunks produced by the last successful run.
    pub chunk_count: i32,
    /// When the source was last successfully indexed.
    pub indexed_at: Option<Timestamp>,
    /// Timestamp when the source was created.
    pub created_at: Timestamp,
    /// Timestamp when the source was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new knowledge source.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = knowledge_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewKnowledgeSource {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub byte_size: i64,
    /// Object-store key.
    pub storage_key: String,
    /// SHA-256 checksum (hex).
    pub checksum: Option<String>,
    /// Initial status.
    pub status: SourceStatus,
}

/// Data for updating a knowledge source.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = knowledge_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateKnowledgeSource {
    /// New status.
    pub status: Option<SourceStatus>,
    /// Replacement error message list.
    pub error_messages: Option<Vec<String>>,
    /// Replacement vector id list.
    pub vector_ids: Option<Vec<String>>,
    /// New chunk count.
    pub chunk_count: Option<i32>,
    /// New indexed-at timestamp.
    pub indexed_at: Option<Option<Timestamp>>,
}

impl KnowledgeSource {
    /// Returns whether the source currently satisfies the indexed invariant:
    /// one owned vector id per chunk.
    pub fn vectors_match_chunks(&self) -> bool {
        self.vector_ids.len() == self.chunk_count as usize
    }
}
