//! Database models.

mod agent;
mod chat_image;
mod document_chunk;
mod index_pin;
mod knowledge_source;
mod model_alias;
mod model_policy;
mod prompt;
mod transcript;

pub use agent::{Agent, NewAgent, RetrievalDefaults, UpdateAgent};
pub use chat_image::{ChatImage, NewChatImage};
pub use document_chunk::{DocumentChunk, EnrichedChunk, FtsChunkHit, NewDocumentChunk};
pub use index_pin::{IndexPin, NewIndexPin};
pub use knowledge_source::{KnowledgeSource, NewKnowledgeSource, UpdateKnowledgeSource};
pub use model_alias::{ModelAlias, ModelCapabilities, NewModelAlias};
pub use model_policy::{AgentModelPolicy, NewAgentModelPolicy};
pub use prompt::{NewPrompt, NewPromptVersion, Prompt, PromptVersion};
pub use transcript::{NewRunMetric, NewTranscript, RunMetric, Transcript};
