//! Prompt version label enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Movable label pointing into a prompt's version history.
///
/// Corresponds to the `PROMPT_LABEL` PostgreSQL enum. For any prompt, at most
/// one version may hold each label other than `none`; the repository enforces
/// this with an atomic clear-then-assign transaction.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::PromptLabel"]
pub enum PromptLabel {
    /// No label assigned.
    #[db_rename = "none"]
    #[serde(rename = "none")]
    #[default]
    Unlabeled,

    /// Development label.
    #[db_rename = "dev"]
    #[serde(rename = "dev")]
    Dev,

    /// Staging label.
    #[db_rename = "staging"]
    #[serde(rename = "staging")]
    Staging,

    /// Production label.
    #[db_rename = "prod"]
    #[serde(rename = "prod")]
    Prod,
}

impl PromptLabel {
    /// Returns whether this label participates in the uniqueness invariant.
    #[inline]
    pub fn is_assignable(self) -> bool {
        !matches!(self, PromptLabel::Unlabeled)
    }
}
