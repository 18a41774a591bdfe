//! Platform entry points.
//!
//! The programmatic surface of the core: `ingest`, `reindex`,
//! `delete_source`, `retrieve`, and `chat`, plus the presign and
//! conversation-cleanup helpers the out-of-scope routers consume. HTTP and
//! CLI wrapping is the caller's responsibility.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use plinth_opendal::{ChatImageKey, PresignedUrl, SourceKey, StorageBackend, StorageKey};
use plinth_postgres::PgClient;
use plinth_postgres::model::{Agent, IndexPin, KnowledgeSource, NewIndexPin};
use plinth_postgres::query::{
    AgentRepository, ChatImageRepository, IndexPinRepository, KnowledgeSourceRepository,
};
use plinth_inference::ProviderRegistry;
use plinth_runtime::ingest::{IngestConfig, IngestService};
use plinth_runtime::retrieve::{
    ChatTurn, RetrievalConfig, RetrievalOverrides, RetrievalResult, Retriever, RetrieverDefaults,
};
use plinth_vector::VectorIndex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::TRACING_TARGET;
use crate::chat::{ChatHandle, ChatRequest, ChatService};
use crate::error::{ServiceError, ServiceResult};

/// Platform configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Ingestion pipeline configuration.
    pub ingest: IngestConfig,
    /// Default model references for the retrieval stages.
    pub retriever_defaults: RetrieverDefaults,
    /// Validity window for presigned URLs.
    pub presign_expiry: Duration,
}

impl PlatformConfig {
    /// Creates a configuration with default ingestion settings and a
    /// fifteen-minute presign window.
    pub fn new(retriever_defaults: RetrieverDefaults) -> Self {
        Self {
            ingest: IngestConfig::default(),
            retriever_defaults,
            presign_expiry: Duration::from_secs(15 * 60),
        }
    }
}

/// The platform core service.
///
/// Owns the ingestion pipeline, the retrieval pipeline, and the chat
/// orchestrator over shared persistence adapters.
#[derive(Clone)]
pub struct PlatformService {
    db: PgClient,
    storage: StorageBackend,
    ingest: IngestService,
    retriever: Retriever,
    chat: ChatService,
    presign_expiry: Duration,
}

impl PlatformService {
    /// Creates the platform service over its persistence adapters.
    pub fn new(
        config: PlatformConfig,
        db: PgClient,
        storage: StorageBackend,
        vectors: Arc<VectorIndex>,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        let ingest = IngestService::new(
            config.ingest,
            db.clone(),
            vectors.clone(),
            storage.clone(),
            registry.clone(),
            config.retriever_defaults.embedding_model.clone(),
        );

        let retriever = Retriever::new(
            db.clone(),
            vectors,
            registry.clone(),
            config.retriever_defaults,
        );

        let chat = ChatService::new(
            db.clone(),
            storage.clone(),
            registry,
            retriever.clone(),
        );

        Self {
            db,
            storage,
            ingest,
            retriever,
            chat,
            presign_expiry: config.presign_expiry,
        }
    }

    /// Ingests a knowledge source, optionally with inline content.
    pub async fn ingest(
        &self,
        source_id: Uuid,
        content: Option<Bytes>,
        cancel: &CancellationToken,
    ) -> ServiceResult<KnowledgeSource> {
        Ok(self.ingest.ingest(source_id, content, cancel).await?)
    }

    /// Reindexes a knowledge source from its stored bytes.
    pub async fn reindex(
        &self,
        source_id: Uuid,
        cancel: &CancellationToken,
    ) -> ServiceResult<KnowledgeSource> {
        Ok(self.ingest.reindex(source_id, cancel).await?)
    }

    /// Reindexes every source of an agent with bounded fan-out.
    pub async fn reindex_agent(
        &self,
        agent_id: Uuid,
        cancel: &CancellationToken,
    ) -> ServiceResult<Vec<(Uuid, ServiceResult<KnowledgeSource>)>> {
        let mut conn = self.db.get_connection().await.map_err(ServiceError::from)?;
        let sources = conn.list_knowledge_sources(agent_id).await?;
        drop(conn);

        let source_ids: Vec<Uuid> = sources.iter().map(|s| s.id).collect();
        let results = self.ingest.reindex_all(source_ids, cancel).await;

        Ok(results
            .into_iter()
            .map(|(id, result)| (id, result.map_err(ServiceError::from)))
            .collect())
    }

    /// Deletes a knowledge source and everything it owns.
    pub async fn delete_source(&self, source_id: Uuid) -> ServiceResult<()> {
        Ok(self.ingest.delete_source(source_id).await?)
    }

    /// Runs the retrieval pipeline for an agent.
    ///
    /// Validates the agent and query up front; the pipeline itself never
    /// fails, it degrades and records.
    pub async fn retrieve(
        &self,
        agent_id: Uuid,
        query: &str,
        history: &[ChatTurn],
        overrides: &RetrievalOverrides,
        cancel: &CancellationToken,
    ) -> ServiceResult<RetrievalResult> {
        if query.trim().is_empty() {
            return Err(ServiceError::invalid("query must not be empty"));
        }

        let mut conn = self.db.get_connection().await.map_err(ServiceError::from)?;
        let agent = conn
            .find_agent(agent_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("agent", agent_id))?;
        drop(conn);

        let config = retrieval_config_for(&agent).with_overrides(overrides);

        Ok(self
            .retriever
            .retrieve(agent_id, query, history, &config, cancel)
            .await)
    }

    /// Runs one chat turn.
    pub async fn chat(
        &self,
        request: ChatRequest,
        cancel: &CancellationToken,
    ) -> ServiceResult<ChatHandle> {
        self.chat.chat(request, cancel).await
    }

    /// Deletes a conversation's images: rows first, then blobs by prefix.
    pub async fn delete_conversation(
        &self,
        agent_id: Uuid,
        conversation_id: Uuid,
    ) -> ServiceResult<usize> {
        let mut conn = self.db.get_connection().await.map_err(ServiceError::from)?;
        let deleted = conn.delete_conversation_images(conversation_id).await?;
        drop(conn);

        let prefix = ChatImageKey::conversation_prefix(agent_id, conversation_id);
        if let Err(error) = self.storage.delete_prefix(&prefix).await {
            tracing::warn!(
                target: TRACING_TARGET,
                conversation_id = %conversation_id,
                error = %error,
                "Conversation blob cleanup failed"
            );
        }

        Ok(deleted.len())
    }

    /// Pins the index version an agent queries against. Idempotent.
    pub async fn pin_index(&self, agent_id: Uuid, index_version: i32) -> ServiceResult<IndexPin> {
        let mut conn = self.db.get_connection().await.map_err(ServiceError::from)?;
        Ok(conn
            .pin_index(NewIndexPin {
                agent_id,
                index_version,
            })
            .await?)
    }

    /// Returns the agent's index pin, if one exists.
    pub async fn index_pin(&self, agent_id: Uuid) -> ServiceResult<Option<IndexPin>> {
        let mut conn = self.db.get_connection().await.map_err(ServiceError::from)?;
        Ok(conn.find_index_pin(agent_id).await?)
    }

    /// Mints a presigned upload URL for a knowledge file.
    pub async fn presign_source_upload(
        &self,
        agent_id: Uuid,
        source_id: Uuid,
        file_name: &str,
    ) -> ServiceResult<PresignedUrl> {
        let key = SourceKey::new(agent_id, source_id, file_name)
            .map_err(|error| ServiceError::invalid(error.to_string()))?;

        Ok(self
            .storage
            .presign_upload(&key.path(), self.presign_expiry)
            .await
            .map_err(plinth_runtime::RuntimeError::from)?)
    }

    /// Mints a presigned download URL for a knowledge file.
    pub async fn presign_source_download(&self, source_id: Uuid) -> ServiceResult<PresignedUrl> {
        let mut conn = self.db.get_connection().await.map_err(ServiceError::from)?;
        let source = conn
            .find_knowledge_source(source_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("knowledge source", source_id))?;
        drop(conn);

        Ok(self
            .storage
            .presign_download(&source.storage_key, self.presign_expiry)
            .await
            .map_err(plinth_runtime::RuntimeError::from)?)
    }
}

impl std::fmt::Debug for PlatformService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformService").finish_non_exhaustive()
    }
}

/// Builds the retrieval configuration from an agent's flattened defaults.
pub(crate) fn retrieval_config_for(agent: &Agent) -> RetrievalConfig {
    let defaults = agent.retrieval_defaults();

    RetrievalConfig {
        enabled: defaults.enabled,
        skip_intent: defaults.skip_intent,
        rewrite: defaults.rewrite,
        rerank: defaults.rerank,
        top_k: defaults.top_k,
        min_similarity: defaults.min_similarity,
        query_variations: defaults.query_variations,
        rewrite_model: defaults.rewrite_model.and_then(|raw| raw.parse().ok()),
        intent_model: defaults.intent_model.and_then(|raw| raw.parse().ok()),
        rerank_model: defaults.rerank_model.and_then(|raw| raw.parse().ok()),
        embedding_model: defaults.embedding_model.and_then(|raw| raw.parse().ok()),
        ..RetrievalConfig::default()
    }
}
