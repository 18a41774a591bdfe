//! Agent model policy model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::agent_model_policies;

/// Time-versioned model policy for an agent.
///
/// The "current" policy is the row with the greatest `effective_from` that is
/// not in the future. Policies are append-only; changing sampling parameters
/// means inserting a new row with a fresh `effective_from`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = agent_model_policies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AgentModelPolicy {
    /// Unique policy identifier.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Model alias the policy selects.
    pub alias_id: Uuid,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling parameter.
    pub top_p: f64,
    /// Maximum completion tokens.
    pub max_tokens: i32,
    /// When this policy becomes current.
    pub effective_from: Timestamp,
    /// Timestamp when the policy was created.
    pub created_at: Timestamp,
}

/// Data for creating a new policy row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = agent_model_policies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewAgentModelPolicy {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Model alias.
    pub alias_id: Uuid,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling parameter.
    pub top_p: f64,
    /// Maximum completion tokens.
    pub max_tokens: i32,
    /// When this policy becomes current.
    pub effective_from: Timestamp,
}
