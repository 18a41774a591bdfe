//! Postgres enum types shared by models and queries.

mod agent_status;
mod agent_visibility;
mod model_provider;
mod prompt_label;
mod source_status;

pub use agent_status::AgentStatus;
pub use agent_visibility::AgentVisibility;
pub use model_provider::ModelProvider;
pub use prompt_label::PromptLabel;
pub use source_status::SourceStatus;
