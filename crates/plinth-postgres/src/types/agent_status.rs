//! Agent lifecycle status enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle status of an agent.
///
/// Corresponds to the `AGENT_STATUS` PostgreSQL enum. Only `active` agents
/// may serve chat turns.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::AgentStatus"]
pub enum AgentStatus {
    /// Agent is being configured and cannot serve traffic yet.
    #[db_rename = "draft"]
    #[serde(rename = "draft")]
    #[default]
    Draft,

    /// Agent is live and may serve chat turns.
    #[db_rename = "active"]
    #[serde(rename = "active")]
    Active,

    /// Agent is retired; configuration is retained but traffic is refused.
    #[db_rename = "archived"]
    #[serde(rename = "archived")]
    Archived,
}

impl AgentStatus {
    /// Returns whether the agent may serve chat turns.
    #[inline]
    pub fn can_serve(self) -> bool {
        matches!(self, AgentStatus::Active)
    }
}
