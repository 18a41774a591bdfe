//! Transcript and run metric repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{NewRunMetric, NewTranscript, RunMetric, Transcript};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for transcript and run metric database operations.
pub trait TranscriptRepository {
    /// Persists a transcript for one LLM turn.
    fn create_transcript(
        &mut self,
        new_transcript: NewTranscript,
    ) -> impl Future<Output = PgResult<Transcript>> + Send;

    /// Finds a transcript by its unique run id.
    fn find_transcript_by_run(
        &mut self,
        run_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Transcript>>> + Send;

    /// Lists a conversation's transcripts in turn order.
    fn list_conversation_transcripts(
        &mut self,
        conversation_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<Transcript>>> + Send;

    /// Persists a run metric.
    fn create_run_metric(
        &mut self,
        new_metric: NewRunMetric,
    ) -> impl Future<Output = PgResult<RunMetric>> + Send;
}

impl TranscriptRepository for PgConnection {
    async fn create_transcript(&mut self, new_transcript: NewTranscript) -> PgResult<Transcript> {
        use schema::transcripts;

        let transcript = diesel::insert_into(transcripts::table)
            .values(&new_transcript)
            .returning(Transcript::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(transcript)
    }

    async fn find_transcript_by_run(&mut self, run_id: Uuid) -> PgResult<Option<Transcript>> {
        use schema::transcripts::dsl;

        let transcript = dsl::transcripts
            .filter(dsl::run_id.eq(run_id))
            .select(Transcript::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(transcript)
    }

    async fn list_conversation_transcripts(
        &mut self,
        conversation_id: Uuid,
    ) -> PgResult<Vec<Transcript>> {
        use schema::transcripts::dsl;

        let transcripts = dsl::transcripts
            .filter(dsl::conversation_id.eq(conversation_id))
            .order(dsl::created_at.asc())
            .select(Transcript::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(transcripts)
    }

    async fn create_run_metric(&mut self, new_metric: NewRunMetric) -> PgResult<RunMetric> {
        use schema::run_metrics;

        let metric = diesel::insert_into(run_metrics::table)
            .values(&new_metric)
            .returning(RunMetric::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(metric)
    }
}
