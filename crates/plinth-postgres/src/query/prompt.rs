//! Prompt repository.
//!
//! Label assignment is the one operation in the platform that needs explicit
//! serialization: clearing the previous holder and assigning the new one
//! happen in a single transaction so two concurrent assignments cannot both
//! claim the same label.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::model::{NewPrompt, NewPromptVersion, Prompt, PromptVersion};
use crate::types::PromptLabel;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for prompt and prompt version database operations.
pub trait PromptRepository {
    /// Creates a new prompt slot.
    fn create_prompt(
        &mut self,
        new_prompt: NewPrompt,
    ) -> impl Future<Output = PgResult<Prompt>> + Send;

    /// Finds an agent's prompt by name.
    fn find_prompt(
        &mut self,
        agent_id: Uuid,
        name: &str,
    ) -> impl Future<Output = PgResult<Option<Prompt>>> + Send;

    /// Creates a new version with the next monotonic version number.
    fn create_prompt_version(
        &mut self,
        prompt_id: Uuid,
        body: String,
        variables: serde_json::Value,
    ) -> impl Future<Output = PgResult<PromptVersion>> + Send;

    /// Lists all versions of a prompt, newest first.
    fn list_prompt_versions(
        &mut self,
        prompt_id: Uuid,
    ) -> impl Future<Output = PgResult<Vec<PromptVersion>>> + Send;

    /// Finds the version of a prompt holding the given label.
    fn find_version_by_label(
        &mut self,
        prompt_id: Uuid,
        label: PromptLabel,
    ) -> impl Future<Output = PgResult<Option<PromptVersion>>> + Send;

    /// Atomically moves a label to the given version.
    ///
    /// Clears the label from any prior holder within the same prompt and
    /// assigns it to `version_id` in one transaction.
    fn assign_prompt_label(
        &mut self,
        prompt_id: Uuid,
        version_id: Uuid,
        label: PromptLabel,
    ) -> impl Future<Output = PgResult<PromptVersion>> + Send;
}

impl PromptRepository for PgConnection {
    async fn create_prompt(&mut self, new_prompt: NewPrompt) -> PgResult<Prompt> {
        use schema::prompts;

        let prompt = diesel::insert_into(prompts::table)
            .values(&new_prompt)
            .returning(Prompt::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(prompt)
    }

    async fn find_prompt(&mut self, agent_id: Uuid, name: &str) -> PgResult<Option<Prompt>> {
        use schema::prompts::dsl;

        let prompt = dsl::prompts
            .filter(dsl::agent_id.eq(agent_id))
            .filter(dsl::name.eq(name))
            .select(Prompt::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(prompt)
    }

    async fn create_prompt_version(
        &mut self,
        prompt_id: Uuid,
        body: String,
        variables: serde_json::Value,
    ) -> PgResult<PromptVersion> {
        use schema::prompt_versions::dsl;

        self.transaction::<PromptVersion, PgError, _>(|conn| {
            async move {
                let max_version: Option<i32> = dsl::prompt_versions
                    .filter(dsl::prompt_id.eq(prompt_id))
                    .select(diesel::dsl::max(dsl::version))
                    .first(conn)
                    .await
                    .map_err(PgError::from)?;

                let new_version = NewPromptVersion {
                    prompt_id,
                    version: max_version.unwrap_or(0) + 1,
                    body,
                    variables,
                    label: PromptLabel::Unlabeled,
                };

                let version = diesel::insert_into(dsl::prompt_versions)
                    .values(&new_version)
                    .returning(PromptVersion::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(PgError::from)?;

                Ok(version)
            }
            .scope_boxed()
        })
        .await
    }

    async fn list_prompt_versions(&mut self, prompt_id: Uuid) -> PgResult<Vec<PromptVersion>> {
        use schema::prompt_versions::dsl;

        let versions = dsl::prompt_versions
            .filter(dsl::prompt_id.eq(prompt_id))
            .order(dsl::version.desc())
            .select(PromptVersion::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(versions)
    }

    async fn find_version_by_label(
        &mut self,
        prompt_id: Uuid,
        label: PromptLabel,
    ) -> PgResult<Option<PromptVersion>> {
        use schema::prompt_versions::dsl;

        let version = dsl::prompt_versions
            .filter(dsl::prompt_id.eq(prompt_id))
            .filter(dsl::label.eq(label))
            .select(PromptVersion::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(version)
    }

    async fn assign_prompt_label(
        &mut self,
        prompt_id: Uuid,
        version_id: Uuid,
        label: PromptLabel,
    ) -> PgResult<PromptVersion> {
        use schema::prompt_versions::dsl;

        if !label.is_assignable() {
            return Err(PgError::Unexpected(
                "the none label cannot be assigned; labels can only be moved".into(),
            ));
        }

        self.transaction::<PromptVersion, PgError, _>(|conn| {
            async move {
                // Clear the label from any current holder within the prompt.
                diesel::update(
                    dsl::prompt_versions
                        .filter(dsl::prompt_id.eq(prompt_id))
                        .filter(dsl::label.eq(label)),
                )
                .set(dsl::label.eq(PromptLabel::Unlabeled))
                .execute(conn)
                .await
                .map_err(PgError::from)?;

                let version = diesel::update(
                    dsl::prompt_versions
                        .filter(dsl::id.eq(version_id))
                        .filter(dsl::prompt_id.eq(prompt_id)),
                )
                .set(dsl::label.eq(label))
                .returning(PromptVersion::as_returning())
                .get_result(conn)
                .await
                .map_err(PgError::from)?;

                Ok(version)
            }
            .scope_boxed()
        })
        .await
    }
}
