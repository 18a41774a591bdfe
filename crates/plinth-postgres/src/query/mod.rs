//! Repository traits implemented on the async connection.

mod agent;
mod chat_image;
mod document_chunk;
mod index_pin;
mod knowledge_source;
mod model;
mod prompt;
mod transcript;

pub use agent::AgentRepository;
pub use chat_image::ChatImageRepository;
pub use document_chunk::DocumentChunkRepository;
pub use index_pin::IndexPinRepository;
pub use knowledge_source::KnowledgeSourceRepository;
pub use model::ModelRepository;
pub use prompt::PromptRepository;
pub use transcript::TranscriptRepository;
