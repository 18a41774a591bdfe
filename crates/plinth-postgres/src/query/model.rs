//! Model alias and policy repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{AgentModelPolicy, ModelAlias, NewAgentModelPolicy, NewModelAlias};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for model alias and policy database operations.
pub trait ModelRepository {
    /// Creates a new model alias.
    fn create_model_alias(
        &mut self,
        new_alias: NewModelAlias,
    ) -> impl Future<Output = PgResult<ModelAlias>> + Send;

    /// Finds an alias by its user-chosen name.
    fn find_model_alias(
        &mut self,
        alias: &str,
    ) -> impl Future<Output = PgResult<Option<ModelAlias>>> + Send;

    /// Finds an alias by id.
    fn find_model_alias_by_id(
        &mut self,
        alias_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<ModelAlias>>> + Send;

    /// Deletes an alias.
    ///
    /// Fails with a foreign-key violation if any policy still references it;
    /// the policy must be rewritten first.
    fn delete_model_alias(
        &mut self,
        alias_id: Uuid,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Appends a new policy row to an agent's timeline.
    fn create_model_policy(
        &mut self,
        new_policy: NewAgentModelPolicy,
    ) -> impl Future<Output = PgResult<AgentModelPolicy>> + Send;

    /// Finds the agent's current policy: the row with the greatest
    /// `effective_from` that is not in the future.
    fn find_current_model_policy(
        &mut self,
        agent_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<AgentModelPolicy>>> + Send;
}

impl ModelRepository for PgConnection {
    async fn create_model_alias(&mut self, new_alias: NewModelAlias) -> PgResult<ModelAlias> {
        use schema::model_aliases;

        let alias = diesel::insert_into(model_aliases::table)
            .values(&new_alias)
            .returning(ModelAlias::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(alias)
    }

    async fn find_model_alias(&mut self, alias: &str) -> PgResult<Option<ModelAlias>> {
        use schema::model_aliases::dsl;

        let found = dsl::model_aliases
            .filter(dsl::alias.eq(alias))
            .select(ModelAlias::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(found)
    }

    async fn find_model_alias_by_id(&mut self, alias_id: Uuid) -> PgResult<Option<ModelAlias>> {
        use schema::model_aliases::dsl;

        let found = dsl::model_aliases
            .filter(dsl::id.eq(alias_id))
            .select(ModelAlias::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(found)
    }

    async fn delete_model_alias(&mut self, alias_id: Uuid) -> PgResult<usize> {
        use schema::model_aliases::{self, dsl};

        let affected = diesel::delete(model_aliases::table.filter(dsl::id.eq(alias_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(affected)
    }

    async fn create_model_policy(
        &mut self,
        new_policy: NewAgentModelPolicy,
    ) -> PgResult<AgentModelPolicy> {
        use schema::agent_model_policies;

        let policy = diesel::insert_into(agent_model_policies::table)
            .values(&new_policy)
            .returning(AgentModelPolicy::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(policy)
    }

    async fn find_current_model_policy(
        &mut self,
        agent_id: Uuid,
    ) -> PgResult<Option<AgentModelPolicy>> {
        use schema::agent_model_policies::dsl;

        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());

        let policy = dsl::agent_model_policies
            .filter(dsl::agent_id.eq(agent_id))
            .filter(dsl::effective_from.le(now))
            .order(dsl::effective_from.desc())
            .select(AgentModelPolicy::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(policy)
    }
}
