//! Agent repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{Agent, NewAgent, UpdateAgent};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for agent database operations.
pub trait AgentRepository {
    /// Creates a new agent.
    fn create_agent(
        &mut self,
        new_agent: NewAgent,
    ) -> impl Future<Output = PgResult<Agent>> + Send;

    /// Finds an agent by id.
    fn find_agent(
        &mut self,
        agent_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<Agent>>> + Send;

    /// Finds an agent by its unique slug.
    fn find_agent_by_slug(
        &mut self,
        slug: &str,
    ) -> impl Future<Output = PgResult<Option<Agent>>> + Send;

    /// Updates an agent.
    fn update_agent(
        &mut self,
        agent_id: Uuid,
        updates: UpdateAgent,
    ) -> impl Future<Output = PgResult<Agent>> + Send;

    /// Deletes an agent. Cascades to its prompts, sources, and chunks.
    fn delete_agent(&mut self, agent_id: Uuid) -> impl Future<Output = PgResult<usize>> + Send;
}

impl AgentRepository for PgConnection {
    async fn create_agent(&mut self, new_agent: NewAgent) -> PgResult<Agent> {
        use schema::agents;

        let agent = diesel::insert_into(agents::table)
            .values(&new_agent)
            .returning(Agent::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(agent)
    }

    async fn find_agent(&mut self, agent_id: Uuid) -> PgResult<Option<Agent>> {
        use schema::agents::dsl;

        let agent = dsl::agents
            .filter(dsl::id.eq(agent_id))
            .select(Agent::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(agent)
    }

    async fn find_agent_by_slug(&mut self, slug: &str) -> PgResult<Option<Agent>> {
        use schema::agents::dsl;

        let agent = dsl::agents
            .filter(dsl::slug.eq(slug))
            .select(Agent::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(agent)
    }

    async fn update_agent(&mut self, agent_id: Uuid, updates: UpdateAgent) -> PgResult<Agent> {
        use schema::agents::{self, dsl};

        let agent = diesel::update(agents::table.filter(dsl::id.eq(agent_id)))
            .set(&updates)
            .returning(Agent::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(agent)
    }

    async fn delete_agent(&mut self, agent_id: Uuid) -> PgResult<usize> {
        use schema::agents::{self, dsl};

        let affected = diesel::delete(agents::table.filter(dsl::id.eq(agent_id)))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(affected)
    }
}
