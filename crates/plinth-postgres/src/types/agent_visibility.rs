//! Agent visibility enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Visibility of an agent.
///
/// Corresponds to the `AGENT_VISIBILITY` PostgreSQL enum.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::AgentVisibility"]
pub enum AgentVisibility {
    /// Visible only to its operator.
    #[db_rename = "private"]
    #[serde(rename = "private")]
    #[default]
    Private,

    /// Visible to all end users of the tenant.
    #[db_rename = "public"]
    #[serde(rename = "public")]
    Public,
}
