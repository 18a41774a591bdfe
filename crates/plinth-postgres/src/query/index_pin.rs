//! Index pin repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::model::{IndexPin, NewIndexPin};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for index pin database operations.
pub trait IndexPinRepository {
    /// Pins an agent's active index version. Idempotent upsert.
    fn pin_index(
        &mut self,
        new_pin: NewIndexPin,
    ) -> impl Future<Output = PgResult<IndexPin>> + Send;

    /// Finds the pin for an agent.
    fn find_index_pin(
        &mut self,
        agent_id: Uuid,
    ) -> impl Future<Output = PgResult<Option<IndexPin>>> + Send;
}

impl IndexPinRepository for PgConnection {
    async fn pin_index(&mut self, new_pin: NewIndexPin) -> PgResult<IndexPin> {
        use schema::index_pins::dsl;

        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());

        let pin = diesel::insert_into(dsl::index_pins)
            .values(&new_pin)
            .on_conflict(dsl::agent_id)
            .do_update()
            .set((
                dsl::index_version.eq(new_pin.index_version),
                dsl::pinned_at.eq(now),
            ))
            .returning(IndexPin::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(pin)
    }

    async fn find_index_pin(&mut self, agent_id: Uuid) -> PgResult<Option<IndexPin>> {
        use schema::index_pins::dsl;

        let pin = dsl::index_pins
            .filter(dsl::agent_id.eq(agent_id))
            .select(IndexPin::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(pin)
    }
}
