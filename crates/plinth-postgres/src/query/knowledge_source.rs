//! Knowledge source repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{KnowledgeSource, NewKnowledgeSource, UpdateKnowledgeSource};
use crate::types::SourceStatus;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for knowledge source database operations.
pub trait KnowledgeSourceRepository {
    /// Creates a new knowledge source.
    fn create_knowledge_source(
        &mut self,
        new_source: NewKnowledgeSource,
    ) -> impl Future<Output = PgResult<KnowledgeSource>> + Send;

    /// Finds a knowledge source by id.
    fn find_knowledge_source(
        &mut self,
        source_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<KnowledgeSource>>> + Send;

    /// Lists an agent's knowledge sources.
    fn list_knowledge_sources(
        &mut self,
        agent_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<KnowledgeSource>>> + Send;

    /// Updates a knowledge source.
    fn update_knowledge_source(
        &mut self,
        source_id: Uuid,
        updates: UpdateKnowledgeSource,
    ) -> impl Future<Output = PgResult<KnowledgeSource>> + Send;

    /// Marks a source failed, appending an error message to its record.
    fn mark_knowledge_source_failed(
        &mut self,
        source_id: Uuid,
        error_message: String,
    ) -> impl Future<Output = PgResult<KnowledgeSource>> + Send;

    /// Deletes a knowledge source. Chunk rows cascade via the foreign key.
    fn delete_knowledge_source(
        &mut self,
        source_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;
}

impl KnowledgeSourceRepository for PgConnection {
    async fn create_knowledge_source(
        &mut self,
        new_source: NewKnowledgeSource,
    ) -> PgResult<KnowledgeSource> {
        use schema::knowledge_sources;

        let source = diesel::insert_into(knowledge_sources::table)
            .values(&new_source)
            .returning(KnowledgeSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn find_knowledge_source(
        &mut self,
        source_id: Uuid,
    ) -> PgResult<Option<KnowledgeSource>> {
        use schema::knowledge_sources::dsl;

        let source = dsl::knowledge_sources
            .filter(dsl::id.eq(source_id))
            .select(KnowledgeSource::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn list_knowledge_sources(&mut self, agent_id: Uuid) -> PgResult<Vec<KnowledgeSource>> {
        use schema::knowledge_sources::dsl;

        let sources = dsl::knowledge_sources
            .filter(dsl::agent_id.eq(agent_id))
            .order(dsl::created_at.asc())
            .select(KnowledgeSource::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(sources)
    }

    async fn update_knowledge_source(
        &mut self,
        source_id: Uuid,
        updates: UpdateKnowledgeSource,
    ) -> PgResult<KnowledgeSource> {
        use schema::knowledge_sources::{self, dsl};

        let source = diesel::update(knowledge_sources::table.filter(dsl::id.eq(source_id)))
            .set(&updates)
            .returning(KnowledgeSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn mark_knowledge_source_failed(
        &mut self,
        source_id: Uuid,
        error_message: String,
    ) -> PgResult<KnowledgeSource> {
        use schema::knowledge_sources::{self, dsl};

        // Append server-side so concurrent failures never drop messages.
        let source = diesel::update(knowledge_sources::table.filter(dsl::id.eq(source_id)))
            .set((
                dsl::status.eq(SourceStatus::Failed),
                dsl::error_messages.eq(diesel::dsl::sql::<
                    diesel::sql_types::Array<diesel::sql_types::Text>,
                >("array_append(error_messages, ")
                .bind::<diesel::sql_types::Text, _>(error_message)
                .sql(")")),
            ))
            .returning(KnowledgeSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn delete_knowledge_source(&mut self, source_id: Uuid) -> PgResult<usize> {
        use schema::knowledge_sources::{self, dsl};

        let affected = diesel::delete(knowledge_sources::table.filter(dsl::id.eq(source_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(affected)
    }
}
