//! Typed request and response bodies for the OpenAI-compatible wire protocol.

use serde::{Deserialize, Serialize};

use crate::usage::UsageStats;

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user turn.
    User,
    /// Model turn.
    Assistant,
}

/// An inline image reference (data URL or https URL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// The URL; inline images use `data:{mime};base64,{payload}`.
    pub url: String,
}

/// One part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// An image, inline or by URL.
    ImageUrl {
        /// The image reference.
        image_url: ImageUrl,
    },
}

impl ContentPart {
    /// Creates a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates an inline image part from base64 data and its MIME type.
    pub fn inline_image(mime_type: &str, base64_data: &str) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl {
                url: format!("data:{mime_type};base64,{base64_data}"),
            },
        }
    }
}

/// Message content: a plain string or a list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Multi-part content.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Returns the text of this content, concatenating text parts.
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: Role,
    /// Message content.
    pub content: MessageContent,
}

impl ChatMessage {
    /// Creates a system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Creates a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Creates a multi-part user message.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }

    /// Creates an assistant message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Streaming options.
#[derive(Debug, Clone, Serialize)]
pub struct StreamOptions {
    /// Request a terminal usage chunk.
    pub include_usage: bool,
}

/// A chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Provider model id.
    pub model: String,
    /// Conversation messages, system first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Enable server-sent event streaming.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Streaming options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

impl ChatRequest {
    /// Creates a request with no sampling overrides.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            max_tokens: None,
            stream: None,
            stream_options: None,
        }
    }
}

/// Token usage as reported on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Completion tokens.
    #[serde(default)]
    pub completion_tokens: u32,
}

impl From<WireUsage> for UsageStats {
    fn from(usage: WireUsage) -> Self {
        UsageStats::new(usage.prompt_tokens, usage.completion_tokens)
    }
}

/// Assistant message in a non-streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage {
    /// Response text.
    #[serde(default)]
    pub content: Option<String>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The assistant message.
    pub message: AssistantMessage,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A non-streaming chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    pub choices: Vec<ChatChoice>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

impl ChatResponse {
    /// Returns the first choice's text, empty if absent.
    pub fn text(&self) -> String {
        self.choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

/// Delta payload of one streaming chunk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamDelta {
    /// Incremental response text.
    #[serde(default)]
    pub content: Option<String>,
}

/// One choice of a streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    /// Incremental delta.
    #[serde(default)]
    pub delta: StreamDelta,
    /// Why generation stopped, on the final content chunk.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// One server-sent streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    /// Chunk choices.
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Usage; present on the terminal chunk when requested.
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

/// An embedding request.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    /// Provider model id.
    pub model: String,
    /// Input documents.
    pub input: Vec<String>,
    /// Requested dimensionality, when the model supports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
}

/// One embedding datum.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    /// Index of the corresponding input.
    pub index: usize,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// An embedding response.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    /// Embedding data, one entry per input.
    pub data: Vec<EmbeddingData>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

/// A cross-encoder rerank request.
#[derive(Debug, Clone, Serialize)]
pub struct RerankRequest {
    /// Provider model id.
    pub model: String,
    /// The query to score passages against.
    pub query: String,
    /// Candidate passages.
    pub documents: Vec<String>,
    /// Number of top results to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u32>,
}

/// One rerank result.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankResult {
    /// Index into the request's documents.
    pub index: usize,
    /// Cross-encoder relevance score.
    pub relevance_score: f64,
}

/// A rerank response.
#[derive(Debug, Clone, Deserialize)]
pub struct RerankResponse {
    /// Results ordered by descending relevance.
    pub results: Vec<RerankResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_content_untagged() {
        let plain: ChatMessage = serde_json::from_value(serde_json::json!({
            "role": "user",
            "content": "hello",
        }))
        .unwrap();
        assert_eq!(plain.content.text(), "hello");

        let parts: ChatMessage = serde_json::from_value(serde_json::json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "look at "},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AA=="}},
                {"type": "text", "text": "this"},
            ],
        }))
        .unwrap();
        assert_eq!(parts.content.text(), "look at this");
    }

    #[test]
    fn request_omits_unset_sampling() {
        let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("hi")]);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn inline_image_data_url() {
        let part = ContentPart::inline_image("image/png", "AAAA");
        match part {
            ContentPart::ImageUrl { image_url } => {
                assert_eq!(image_url.url, "data:image/png;base64,AAAA");
            }
            _ => panic!("expected image part"),
        }
    }

    #[test]
    fn stream_chunk_tolerates_empty_choices() {
        // The terminal usage chunk has no choices.
        let chunk: StreamChunk = serde_json::from_value(serde_json::json!({
            "choices": [],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4},
        }))
        .unwrap();
        assert!(chunk.choices.is_empty());
        assert_eq!(chunk.usage.unwrap().completion_tokens, 4);
    }
}
