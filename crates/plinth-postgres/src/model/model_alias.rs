//! Model alias model for PostgreSQL database operations.

use diesel::prelude::*;
use jiff_diesel::Timestamp;
use uuid::Uuid;

use crate::schema::model_aliases;
use crate::types::ModelProvider;

/// A user-chosen name mapped to a provider model and its capabilities.
///
/// Aliases are the unit of model selection: prompts and policies reference
/// aliases, never raw provider model ids. An alias bound to a policy cannot
/// be deleted (enforced by a `RESTRICT` foreign key).
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = model_aliases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ModelAlias {
    /// Unique alias identifier.
    pub id: Uuid,
    /// The user-chosen alias name.
    pub alias: String,
    /// Provider this alias resolves to.
    pub provider: ModelProvider,
    /// Provider-side model identifier.
    pub provider_model_id: String,
    /// Text input support.
    pub supports_text_input: bool,
    /// Image input support.
    pub supports_image_input: bool,
    /// Audio input support.
    pub supports_audio_input: bool,
    /// Video input support.
    pub supports_video_input: bool,
    /// PDF input support.
    pub supports_pdf_input: bool,
    /// Tool-calling support.
    pub supports_tools: bool,
    /// Structured output support.
    pub supports_structured_output: bool,
    /// Context window in tokens.
    pub context_window: i32,
    /// Input cost per million tokens, USD.
    pub input_cost_per_million: f64,
    /// Output cost per million tokens, USD.
    pub output_cost_per_million: f64,
    /// Timestamp when the alias was created.
    pub created_at: Timestamp,
    /// Timestamp when the alias was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new model alias.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = model_aliases)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewModelAlias {
    /// The user-chosen alias name.
    pub alias: String,
    /// Provider.
    pub provider: ModelProvider,
    /// Provider-side model identifier.
    pub provider_model_id: String,
    /// Text input support.
    pub supports_text_input: bool,
    /// Image input support.
    pub supports_image_input: bool,
    /// Audio input support.
    pub supports_audio_input: bool,
    /// Video input support.
    pub supports_video_input: bool,
    /// PDF input support.
    pub supports_pdf_input: bool,
    /// Tool-calling support.
    pub supports_tools: bool,
    /// Structured output support.
    pub supports_structured_output: bool,
    /// Context window in tokens.
    pub context_window: i32,
    /// Input cost per million tokens, USD.
    pub input_cost_per_million: f64,
    /// Output cost per million tokens, USD.
    pub output_cost_per_million: f64,
}

/// Input-modality and feature capabilities of a model alias.
#[derive(Debug, Clone, Copy)]
pub struct ModelCapabilities {
    /// Text input support.
    pub text_input: bool,
    /// Image input support.
    pub image_input: bool,
    /// Audio input support.
    pub audio_input: bool,
    /// Video input support.
    pub video_input: bool,
    /// PDF input support.
    pub pdf_input: bool,
    /// Tool-calling support.
    pub tools: bool,
    /// Structured output support.
    pub structured_output: bool,
}

impl ModelAlias {
    /// Returns the alias capabilities as a value type.
    pub fn capabilities(&self) -> ModelCapabilities {
        ModelCapabilities {
            text_input: self.supports_text_input,
            image_input: self.supports_image_input,
            audio_input: self.supports_audio_input,
            video_input: self.supports_video_input,
            pdf_input: self.supports_pdf_input,
            tools: self.supports_tools,
            structured_output: self.supports_structured_output,
        }
    }

    /// Estimated cost of a turn in USD for the given token counts.
    pub fn turn_cost_usd(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 * self.input_cost_per_million
            + output_tokens as f64 * self.output_cost_per_million)
            / 1_000_000.0
    }
}
