//! Model provider enumeration.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Provider a model alias resolves to.
///
/// Corresponds to the `MODEL_PROVIDER` PostgreSQL enum. `local` providers are
/// never routed through the AI gateway.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, DbEnum, Display, EnumIter, EnumString)]
#[ExistingTypePath = "crate::schema::sql_types::ModelProvider"]
pub enum ModelProvider {
    /// Hosted OpenAI API.
    #[db_rename = "openai"]
    #[serde(rename = "openai")]
    #[default]
    OpenAi,

    /// OpenRouter (OpenAI-compatible).
    #[db_rename = "openrouter"]
    #[serde(rename = "openrouter")]
    OpenRouter,

    /// HuggingFace inference router (OpenAI-compatible).
    #[db_rename = "huggingface"]
    #[serde(rename = "huggingface")]
    HuggingFace,

    /// Local inference binding (Ollama or compatible).
    #[db_rename = "local"]
    #[serde(rename = "local")]
    Local,
}

impl ModelProvider {
    /// Returns whether models from this provider run on the local binding.
    ///
    /// Local inference must never be routed through an external gateway.
    #[inline]
    pub fn is_local(self) -> bool {
        matches!(self, ModelProvider::Local)
    }
}
