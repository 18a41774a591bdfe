//! Document chunk model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::document_chunks;

/// A text segment of a knowledge source.
///
/// `(source_id, chunk_index)` is unique and the index is dense and monotonic
/// within a source. The full-text shadow is a generated `tsvector` column
/// maintained by Postgres; it is deliberately absent from the diesel table
/// definition so typed inserts never touch it.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DocumentChunk {
    /// Unique chunk identifier; doubles as the vector id.
    pub id: Uuid,
    /// Owning agent (denormalized for tenant-scoped FTS).
    pub agent_id: Uuid,
    /// Owning knowledge source.
    pub source_id: Uuid,
    /// Zero-based index of this chunk within its source.
    pub chunk_index: i32,
    /// Chunk text. The authoritative copy; vector metadata never carries it.
    pub content: String,
    /// Id of the chunk's vector in the vector index.
    pub vector_id: Option<String>,
    /// Estimated token count.
    pub token_count: i32,
    /// Timestamp when the chunk was created.
    pub created_at: Timestamp,
}

/// Data for creating a new document chunk.
///
/// The id is generated by the caller before insert so the same value can be
/// used as the vector id in the vector index.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = document_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDocumentChunk {
    /// Chunk id, pre-generated by the ingestion pipeline.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Owning knowledge source.
    pub source_id: Uuid,
    /// Zero-based index within the source.
    pub chunk_index: i32,
    /// Chunk text.
    pub content: String,
    /// Vector id, when known at insert time.
    pub vector_id: Option<String>,
    /// Estimated token count.
    pub token_count: i32,
}

/// A chunk joined with its source's authoritative file name.
///
/// Returned by the enrichment query.
#[derive(Debug, Clone)]
pub struct EnrichedChunk {
    /// The chunk row.
    pub chunk: DocumentChunk,
    /// File name of the owning knowledge source.
    pub file_name: String,
}

/// A full-text search hit.
#[derive(Debug, Clone, QueryableByName)]
pub struct FtsChunkHit {
    /// Chunk id.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: Uuid,
    /// Owning knowledge source.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub source_id: Uuid,
    /// Chunk index within the source.
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub chunk_index: i32,
    /// Chunk text.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub content: String,
    /// `ts_rank` score.
    #[diesel(sql_type = diesel::sql_types::Float)]
    pub rank: f32,
}
