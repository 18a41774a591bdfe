//! Provider paths and capability wrappers.
//!
//! Three provider paths share the OpenAI-compatible wire protocol: the hosted
//! API, OpenAI-compatible routers (OpenRouter, HuggingFace), and local
//! inference bindings. They differ only in endpoint configuration, and local
//! bindings are never routed through the AI gateway.

mod completion;
mod embedding;
mod rerank;

use serde::{Deserialize, Serialize};

pub use completion::{CompletionProvider, GenParams};
pub use embedding::{DEFAULT_MAX_DOCUMENTS, EmbeddingProvider};
pub use rerank::{RerankHit, RerankProvider};

/// Provider a model runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hosted OpenAI API.
    OpenAi,
    /// OpenRouter (OpenAI-compatible router).
    OpenRouter,
    /// HuggingFace inference router (OpenAI-compatible).
    HuggingFace,
    /// Local inference binding (Ollama or compatible).
    Local,
}

impl Provider {
    /// Returns the provider name as a static string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::HuggingFace => "huggingface",
            Self::Local => "local",
        }
    }

    /// Returns whether this provider runs on the local inference binding.
    ///
    /// Local inference must never be routed through an external gateway.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }

    /// Returns the provider's default base URL.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::HuggingFace => "https://router.huggingface.co/v1",
            Self::Local => "http://localhost:11434/v1",
        }
    }
}

/// Resolved endpoint configuration for one provider path.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// The provider this endpoint reaches.
    pub provider: Provider,
    /// Base URL including the version path, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token, if the endpoint requires one.
    pub api_key: Option<String>,
    /// Additional request headers (gateway routing metadata).
    pub headers: Vec<(String, String)>,
}

impl EndpointConfig {
    /// Creates an endpoint with the provider's default base URL.
    pub fn new(provider: Provider, api_key: Option<String>) -> Self {
        Self {
            provider,
            base_url: provider.default_base_url().to_string(),
            api_key,
            headers: Vec::new(),
        }
    }

    /// Overrides the base URL (local bindings, self-hosted routers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Appends a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names() {
        assert_eq!(Provider::OpenAi.as_str(), "openai");
        assert_eq!(Provider::Local.as_str(), "local");
        assert!(Provider::Local.is_local());
        assert!(!Provider::OpenRouter.is_local());
    }

    #[test]
    fn endpoint_defaults() {
        let endpoint = EndpointConfig::new(Provider::OpenRouter, Some("key".into()));
        assert_eq!(endpoint.base_url, "https://openrouter.ai/api/v1");
        assert!(endpoint.headers.is_empty());
    }
}
