//! Document chunk repository.
//!
//! Handles chunk lifecycle (batched creation in `chunk_index` order, cascade
//! deletion with the source), neighbor fetches for expansion, the enrichment
//! join, and tenant-scoped full-text search over the tsvector shadow column.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{DocumentChunk, EnrichedChunk, FtsChunkHit, NewDocumentChunk};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for document chunk database operations.
pub trait DocumentChunkRepository {
    /// Creates multiple document chunks in a single statement.
    ///
    /// Callers pass chunks ordered by `chunk_index` so concurrent readers
    /// never observe gaps within a source.
    fn create_document_chunks(
        &mut self,
        new_chunks: Vec<NewDocumentChunk>,
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Lists all chunks of a source ordered by chunk index.
    fn list_source_chunks(
        &mut self,
        source_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Counts the chunks of a source.
    fn count_source_chunks(
        &mut self,
        source_id: Uuid,
    ) -> impl Future<Output = PgResult<i64>> + Send;

    /// Deletes all chunks of a source.
    fn delete_source_chunks(
        &mut self,
        source_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Fetches chunks by id, joined with their source's file name.
    fn find_chunks_with_sources(
        &mut self,
        chunk_ids: &[Uuid],
    ) -> impl Future<Output = PgResult<Vec<EnrichedChunk>>> + Send;

    /// Fetches candidate neighbor chunks with one batched query.
    ///
    /// Returns every chunk whose `source_id` is in `source_ids` and whose
    /// `chunk_index` is in `chunk_indices`; the caller filters down to exact
    /// `(source_id, chunk_index)` pairs in memory.
    fn find_neighbor_chunks(
        &mut self,
        source_ids: &[Uuid],
        chunk_indices: &[i32],
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Runs a compound full-text MATCH over an agent's chunk corpus.
    ///
    /// `match_expr` is the `"term1" OR "term2"` form accepted by
    /// `websearch_to_tsquery`. Returns hits ranked by `ts_rank`.
    fn search_chunks_fts(
        &mut self,
        agent_id: Uuid,
        match_expr: &str,
        limit: i64,
    ) -> impl Future<Output = PgResult<Vec<FtsChunkHit>>> + Send;
}

impl DocumentChunkRepository for PgConnection {
    async fn create_document_chunks(
        &mut self,
        new_chunks: Vec<NewDocumentChunk>,
    ) -> PgResult<Vec<DocumentChunk>> {
        use schema::document_chunks;

        if new_chunks.is_empty() {
            return Ok(vec![]);
        }

        let chunks = diesel::insert_into(document_chunks::table)
            .values(&new_chunks)
            .returning(DocumentChunk::as_returning())
            .get_results(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunks)
    }

    async fn list_source_chunks(&mut self, source_id: Uuid) -> PgResult<Vec<DocumentChunk>> {
        use schema::document_chunks::dsl;

        let chunks = dsl::document_chunks
            .filter(dsl::source_id.eq(source_id))
            .order(dsl::chunk_index.asc())
            .select(DocumentChunk::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunks)
    }

    async fn count_source_chunks(&mut self, source_id: Uuid) -> PgResult<i64> {
        use schema::document_chunks::dsl;

        let count = dsl::document_chunks
            .filter(dsl::source_id.eq(source_id))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(count)
    }

    async fn delete_source_chunks(&mut self, source_id: Uuid) -> PgResult<usize> {
        use schema::document_chunks::{self, dsl};

        let affected =
            diesel::delete(document_chunks::table.filter(dsl::source_id.eq(source_id)))
                .execute(self)
                .await
                .map_err(PgError::from)?;

        Ok(affected)
    }

    async fn find_chunks_with_sources(
        &mut self,
        chunk_ids: &[Uuid],
    ) -> PgResult<Vec<EnrichedChunk>> {
        use schema::{document_chunks, knowledge_sources};

        if chunk_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<(DocumentChunk, String)> = document_chunks::table
            .inner_join(knowledge_sources::table)
            .filter(document_chunks::id.eq_any(chunk_ids))
            .select((DocumentChunk::as_select(), knowledge_sources::file_name))
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows
            .into_iter()
            .map(|(chunk, file_name)| EnrichedChunk { chunk, file_name })
            .collect())
    }

    async fn find_neighbor_chunks(
        &mut self,
        source_ids: &[Uuid],
        chunk_indices: &[i32],
    ) -> PgResult<Vec<DocumentChunk>> {
        use schema::document_chunks::dsl;

        if source_ids.is_empty() || chunk_indices.is_empty() {
            return Ok(vec![]);
        }

        let chunks = dsl::document_chunks
            .filter(dsl::source_id.eq_any(source_ids))
            .filter(dsl::chunk_index.eq_any(chunk_indices))
            .select(DocumentChunk::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunks)
    }

    async fn search_chunks_fts(
        &mut self,
        agent_id: Uuid,
        match_expr: &str,
        limit: i64,
    ) -> PgResult<Vec<FtsChunkHit>> {
        let hits = diesel::sql_query(
            "SELECT id, source_id, chunk_index, content, \
             ts_rank(content_tsv, websearch_to_tsquery('english', $1)) AS rank \
             FROM document_chunks \
             WHERE agent_id = $2 \
               AND content_tsv @@ websearch_to_tsquery('english', $1) \
             ORDER BY rank DESC \
             LIMIT $3",
        )
        .bind::<diesel::sql_types::Text, _>(match_expr)
        .bind::<diesel::sql_types::Uuid, _>(agent_id)
        .bind::<diesel::sql_types::BigInt, _>(limit)
        .load::<FtsChunkHit>(self)
        .await
        .map_err(PgError::from)?;

        Ok(hits)
    }
}
