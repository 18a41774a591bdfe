//! Ingestion pipeline: file → parsed text → chunks → embeddings → dual index.
//!
//! The pipeline is idempotent per source. Every run starts by deleting the
//! source's prior chunks and vectors, so a failed run leaves nothing behind
//! that the next run will not overwrite or remove. Only one run per source
//! may be in flight at a time.

mod chunker;
mod parser;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub use chunker::{Chunker, ChunkerConfig, estimate_tokens};
pub use parser::{DocumentFormat, parse_document};

use plinth_postgres::model::{KnowledgeSource, NewDocumentChunk, UpdateKnowledgeSource};
use plinth_postgres::query::{
    AgentRepository, DocumentChunkRepository, KnowledgeSourceRepository,
};
use plinth_postgres::types::SourceStatus;
use plinth_postgres::PgClient;
use plinth_opendal::StorageBackend;
use plinth_inference::{ModelRef, ProviderRegistry};
use plinth_vector::{VectorIndex, VectorRecord};

use crate::TRACING_TARGET;
use crate::error::{RuntimeError, RuntimeResult};

/// Bounded fan-out for bulk reindexing.
const BULK_CONCURRENCY: usize = 3;

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    /// Chunking parameters.
    pub chunker: ChunkerConfig,
}

/// Ingestion pipeline service.
///
/// Cheaply cloneable; clones share the in-flight source set.
#[derive(Clone)]
pub struct IngestService {
    inner: Arc<IngestInner>,
}

struct IngestInner {
    db: PgClient,
    vectors: Arc<VectorIndex>,
    storage: StorageBackend,
    registry: Arc<ProviderRegistry>,
    default_embedding: ModelRef,
    chunker: Chunker,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl IngestService {
    /// Creates a new ingestion service.
    pub fn new(
        config: IngestConfig,
        db: PgClient,
        vectors: Arc<VectorIndex>,
        storage: StorageBackend,
        registry: Arc<ProviderRegistry>,
        default_embedding: ModelRef,
    ) -> Self {
        Self {
            inner: Arc::new(IngestInner {
                db,
                vectors,
                storage,
                registry,
                default_embedding,
                chunker: Chunker::new(config.chunker),
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Ingests a knowledge source.
    ///
    /// `content` may carry the file bytes inline for small files; otherwise
    /// they are fetched from object storage via the source's storage key.
    /// On success the source transitions to `indexed` with its vector ids
    /// recorded; on failure it transitions to `failed` with the error
    /// message appended.
    pub async fn ingest(
        &self,
        source_id: Uuid,
        content: Option<Bytes>,
        cancel: &CancellationToken,
    ) -> RuntimeResult<KnowledgeSource> {
        let _guard = self.claim(source_id)?;

        let mut conn = self.inner.db.get_connection().await.map_err(RuntimeError::from)?;

        let source = conn
            .find_knowledge_source(source_id)
            .await?
            .ok_or_else(|| RuntimeError::not_found("knowledge source", source_id))?;

        if source.status.is_processing() {
            return Err(RuntimeError::IngestInFlight(source_id));
        }

        conn.update_knowledge_source(
            source.id,
            UpdateKnowledgeSource {
                status: Some(SourceStatus::Processing),
                ..Default::default()
            },
        )
        .await?;

        match self.run_pipeline(&mut conn, &source, content, cancel).await {
            Ok(indexed) => Ok(indexed),
            Err(error) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    source_id = %source_id,
                    error = %error,
                    "Ingestion failed"
                );

                if let Err(update_error) = conn
                    .mark_knowledge_source_failed(source.id, error.to_string())
                    .await
                {
                    tracing::error!(
                        target: TRACING_TARGET,
                        source_id = %source_id,
                        error = %update_error,
                        "Failed to record ingestion failure"
                    );
                }

                Err(error)
            }
        }
    }

    /// Reindexes a source from its stored bytes.
    ///
    /// Equivalent to [`IngestService::ingest`] without inline content: prior
    /// chunks and vectors are deleted before reprocessing.
    pub async fn reindex(
        &self,
        source_id: Uuid,
        cancel: &CancellationToken,
    ) -> RuntimeResult<KnowledgeSource> {
        self.ingest(source_id, None, cancel).await
    }

    /// Reindexes many sources with bounded fan-out.
    ///
    /// Returns per-source results; a failed source does not abort the batch.
    pub async fn reindex_all(
        &self,
        source_ids: Vec<Uuid>,
        cancel: &CancellationToken,
    ) -> Vec<(Uuid, RuntimeResult<KnowledgeSource>)> {
        futures::stream::iter(source_ids.into_iter().map(|source_id| {
            let service = self.clone();
            let cancel = cancel.clone();
            async move {
                let result = service.reindex(source_id, &cancel).await;
                (source_id, result)
            }
        }))
        .buffer_unordered(BULK_CONCURRENCY)
        .collect()
        .await
    }

    /// Deletes a source: its vectors, its chunk rows (cascade), its record,
    /// and its stored bytes.
    pub async fn delete_source(&self, source_id: Uuid) -> RuntimeResult<()> {
        let mut conn = self.inner.db.get_connection().await.map_err(RuntimeError::from)?;

        let source = conn
            .find_knowledge_source(source_id)
            .await?
            .ok_or_else(|| RuntimeError::not_found("knowledge source", source_id))?;

        let namespace = source.agent_id.to_string();
        if let Err(error) = self
            .inner
            .vectors
            .delete(&namespace, source.vector_ids.clone())
            .await
        {
            // The next reindex overwrites by id; deletion failures never block.
            tracing::warn!(
                target: TRACING_TARGET,
                source_id = %source_id,
                error = %error,
                "Vector deletion failed during source removal"
            );
        }

        conn.delete_knowledge_source(source_id).await?;

        if let Err(error) = self.inner.storage.delete(&source.storage_key).await {
            tracing::warn!(
                target: TRACING_TARGET,
                source_id = %source_id,
                error = %error,
                "Blob deletion failed during source removal"
            );
        }

        tracing::info!(
            target: TRACING_TARGET,
            source_id = %source_id,
            agent_id = %source.agent_id,
            "Deleted knowledge source"
        );

        Ok(())
    }

    /// Stages 1-5 of the pipeline. Any error here fails the source.
    async fn run_pipeline(
        &self,
        conn: &mut plinth_postgres::PgConnection,
        source: &KnowledgeSource,
        content: Option<Bytes>,
        cancel: &CancellationToken,
    ) -> RuntimeResult<KnowledgeSource> {
        let namespace = source.agent_id.to_string();

        // Reindex starts by deleting prior artifacts.
        if !source.vector_ids.is_empty()
            && let Err(error) = self
                .inner
                .vectors
                .delete(&namespace, source.vector_ids.clone())
                .await
        {
            tracing::warn!(
                target: TRACING_TARGET,
                source_id = %source.id,
                error = %error,
                "Prior vector deletion failed; reindex will overwrite by id"
            );
        }
        conn.delete_source_chunks(source.id).await?;

        self.check_cancelled(cancel)?;

        let bytes = match content {
            Some(bytes) => bytes,
            None => self.inner.storage.read(&source.storage_key).await?,
        };

        if let Some(ref expected) = source.checksum {
            let actual = hex_digest(&bytes);
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(RuntimeError::invalid(format!(
                    "checksum mismatch: expected {expected}, got {actual}"
                )));
            }
        }

        // Stage 1: parse.
        let text = parse_document(&source.mime_type, &bytes)?;

        conn.update_knowledge_source(
            source.id,
            UpdateKnowledgeSource {
                status: Some(SourceStatus::Parsed),
                ..Default::default()
            },
        )
        .await?;

        self.check_cancelled(cancel)?;

        // Stage 2: chunk.
        let chunks = self.inner.chunker.split(&text);
        if chunks.is_empty() {
            return Err(RuntimeError::invalid("document produced no chunks"));
        }

        // Stage 3: embed. Dimension mismatches are fatal here.
        let embedding_model = self.embedding_model(conn, source).await?;
        let embeddings = self
            .inner
            .registry
            .embedding(&embedding_model)?
            .embed_texts(chunks.clone(), cancel)
            .await?;

        self.check_cancelled(cancel)?;

        // Stage 4: write both indices. Chunk rows are inserted in
        // chunk_index order so readers never observe gaps.
        let chunk_ids: Vec<Uuid> = chunks.iter().map(|_| Uuid::new_v4()).collect();

        let new_chunks: Vec<NewDocumentChunk> = chunks
            .iter()
            .zip(&chunk_ids)
            .enumerate()
            .map(|(index, (content, id))| NewDocumentChunk {
                id: *id,
                agent_id: source.agent_id,
                source_id: source.id,
                chunk_index: index as i32,
                content: content.clone(),
                vector_id: Some(id.to_string()),
                token_count: estimate_tokens(content),
            })
            .collect();

        conn.create_document_chunks(new_chunks).await?;

        let records: Vec<VectorRecord> = chunk_ids
            .iter()
            .zip(&embeddings)
            .enumerate()
            .map(|(index, (id, embedding))| {
                VectorRecord::new(id.to_string(), embedding.clone())
                    .with_field("sourceId", serde_json::json!(source.id))
                    .with_field("fileName", serde_json::json!(source.file_name))
                    .with_field("chunkIndex", serde_json::json!(index))
            })
            .collect();

        self.inner.vectors.upsert(&namespace, records).await?;

        // Stage 5: commit.
        let vector_ids: Vec<String> = chunk_ids.iter().map(Uuid::to_string).collect();
        let indexed = conn
            .update_knowledge_source(
                source.id,
                UpdateKnowledgeSource {
                    status: Some(SourceStatus::Indexed),
                    vector_ids: Some(vector_ids),
                    chunk_count: Some(chunk_ids.len() as i32),
                    indexed_at: Some(Some(jiff::Timestamp::now().into())),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(
            target: TRACING_TARGET,
            source_id = %source.id,
            agent_id = %source.agent_id,
            chunks = chunk_ids.len(),
            "Indexed knowledge source"
        );

        Ok(indexed)
    }

    /// Resolves the embedding model: agent override, then platform default.
    async fn embedding_model(
        &self,
        conn: &mut plinth_postgres::PgConnection,
        source: &KnowledgeSource,
    ) -> RuntimeResult<ModelRef> {
        let agent = conn.find_agent(source.agent_id).await?;

        let model_ref = agent
            .and_then(|a| a.embedding_model)
            .and_then(|raw| raw.parse::<ModelRef>().ok())
            .unwrap_or_else(|| self.inner.default_embedding.clone());

        Ok(model_ref)
    }

    fn check_cancelled(&self, cancel: &CancellationToken) -> RuntimeResult<()> {
        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        Ok(())
    }

    fn claim(&self, source_id: Uuid) -> RuntimeResult<InFlightGuard> {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !in_flight.insert(source_id) {
            return Err(RuntimeError::IngestInFlight(source_id));
        }

        Ok(InFlightGuard {
            inner: self.inner.clone(),
            source_id,
        })
    }
}

impl std::fmt::Debug for IngestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestService")
            .field("chunker", self.inner.chunker.config())
            .finish_non_exhaustive()
    }
}

/// Removes the source from the in-flight set when an ingestion run ends.
struct InFlightGuard {
    inner: Arc<IngestInner>,
    source_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&self.source_id);
    }
}

fn hex_digest(bytes: &Bytes) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_digest_is_stable() {
        let digest = hex_digest(&Bytes::from_static(b"hello"));
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
