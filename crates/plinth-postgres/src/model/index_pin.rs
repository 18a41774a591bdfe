//! Index pin model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::index_pins;

/// Per-agent pointer to the active index version used at query time.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = index_pins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IndexPin {
    /// Owning agent (primary key).
    pub agent_id: Uuid,
    /// Pinned index version.
    pub index_version: i32,
    /// When the pin was last moved.
    pub pinned_at: Timestamp,
}

/// Data for creating or moving an index pin.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = index_pins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIndexPin {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Index version to pin.
    pub index_version: i32,
}
