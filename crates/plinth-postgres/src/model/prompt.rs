//! Prompt and prompt version models for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::{prompt_versions, prompts};
use crate::types::PromptLabel;

/// An agent-scoped named prompt slot, e.g. `system`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = prompts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Prompt {
    /// Unique prompt identifier.
    pub id: Uuid,
    /// Owning agent.
    pub agent_id: Uuid,
    /// Slot name, unique per agent.
    pub name: String,
    /// Timestamp when the prompt was created.
    pub created_at: Timestamp,
    /// Timestamp when the prompt was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new prompt.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = prompts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPrompt {
    /// Owning agent.
    pub agent_id: Uuid,
    /// Slot name.
    pub name: String,
}

/// A version of a prompt's content body.
///
/// Versions carry a monotonic integer `version` unique within their prompt,
/// a body with `{{variable}}` placeholders, a defaults map for those
/// variables, and at most one movable label.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = prompt_versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PromptVersion {
    /// Unique version identifier.
    pub id: Uuid,
    /// Owning prompt.
    pub prompt_id: Uuid,
    /// Monotonic version number within the prompt.
    pub version: i32,
    /// Content body with `{{variable}}` placeholders.
    pub body: String,
    /// Default values for template variables (JSON object).
    pub variables: serde_json::Value,
    /// Label held by this version, if any.
    pub label: PromptLabel,
    /// Timestamp when the version was created.
    pub created_at: Timestamp,
}

/// Data for creating a new prompt version.
///
/// The `version` number is assigned by the repository inside the same
/// transaction that inserts the row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = prompt_versions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPromptVersion {
    /// Owning prompt.
    pub prompt_id: Uuid,
    /// Monotonic version number.
    pub version: i32,
    /// Content body.
    pub body: String,
    /// Default variable values.
    pub variables: serde_json::Value,
    /// Initial label.
    pub label: PromptLabel,
}

impl PromptVersion {
    /// Returns the defaults map as string pairs, skipping non-string values.
    pub fn variable_defaults(&self) -> Vec<(String, String)> {
        self.variables
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}
