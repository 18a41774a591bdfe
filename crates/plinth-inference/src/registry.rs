//! Process-wide provider registry.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};
use crate::gateway::GatewayConfig;
use crate::provider::{
    CompletionProvider, EmbeddingProvider, EndpointConfig, Provider, RerankProvider,
};

/// Reference to a specific model in the form `provider/model`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    /// Provider the model runs on.
    pub provider: Provider,
    /// Provider-side model identifier.
    pub model: String,
}

impl ModelRef {
    /// Creates a new model reference.
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

impl FromStr for ModelRef {
    type Err = LlmError;

    fn from_str(s: &str) -> LlmResult<Self> {
        let (provider, model) = s.split_once('/').ok_or_else(|| {
            LlmError::config(format!(
                "invalid model reference '{s}': expected 'provider/model'"
            ))
        })?;

        let provider = Provider::from_str(provider)
            .map_err(|_| LlmError::config(format!("unknown provider: {provider}")))?;

        Ok(Self::new(provider, model))
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Process-wide registry of memoized model clients.
///
/// Clients are keyed by `(provider, model)` and constructed once; eviction is
/// not required for correctness. The registry also owns endpoint resolution:
/// API keys per provider, the local binding's base URL, and optional gateway
/// routing (never applied to local providers).
pub struct ProviderRegistry {
    api_keys: HashMap<Provider, String>,
    local_base_url: String,
    gateway: Option<GatewayConfig>,
    embedding_dimensions: usize,
    completions: Mutex<HashMap<ModelRef, CompletionProvider>>,
    embeddings: Mutex<HashMap<ModelRef, EmbeddingProvider>>,
    rerankers: Mutex<HashMap<ModelRef, RerankProvider>>,
}

impl ProviderRegistry {
    /// Creates a new registry.
    ///
    /// `embedding_dimensions` is the platform dimensionality D enforced on
    /// every embedding client created through the registry.
    pub fn new(
        api_keys: HashMap<Provider, String>,
        local_base_url: impl Into<String>,
        gateway: Option<GatewayConfig>,
        embedding_dimensions: usize,
    ) -> Self {
        Self {
            api_keys,
            local_base_url: local_base_url.into(),
            gateway,
            embedding_dimensions,
            completions: Mutex::new(HashMap::new()),
            embeddings: Mutex::new(HashMap::new()),
            rerankers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the platform embedding dimensionality.
    pub fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    /// Resolves the endpoint for a provider, applying gateway routing for
    /// non-local providers.
    pub fn endpoint(&self, provider: Provider) -> EndpointConfig {
        let api_key = self.api_keys.get(&provider).cloned();

        let endpoint = if provider.is_local() {
            EndpointConfig::new(provider, api_key).with_base_url(self.local_base_url.clone())
        } else {
            EndpointConfig::new(provider, api_key)
        };

        match &self.gateway {
            Some(gateway) => gateway.apply(endpoint),
            None => endpoint,
        }
    }

    /// Returns the memoized completion provider for a model reference.
    pub fn completion(&self, model_ref: &ModelRef) -> LlmResult<CompletionProvider> {
        let mut cache = self
            .completions
            .lock()
            .map_err(|_| LlmError::config("provider registry lock poisoned"))?;

        if let Some(provider) = cache.get(model_ref) {
            return Ok(provider.clone());
        }

        let provider =
            CompletionProvider::new(self.endpoint(model_ref.provider), &model_ref.model)?;
        cache.insert(model_ref.clone(), provider.clone());
        Ok(provider)
    }

    /// Returns the memoized embedding provider for a model reference.
    pub fn embedding(&self, model_ref: &ModelRef) -> LlmResult<EmbeddingProvider> {
        let mut cache = self
            .embeddings
            .lock()
            .map_err(|_| LlmError::config("provider registry lock poisoned"))?;

        if let Some(provider) = cache.get(model_ref) {
            return Ok(provider.clone());
        }

        let provider = EmbeddingProvider::new(
            self.endpoint(model_ref.provider),
            &model_ref.model,
            self.embedding_dimensions,
        )?;
        cache.insert(model_ref.clone(), provider.clone());
        Ok(provider)
    }

    /// Returns the memoized rerank provider for a model reference.
    pub fn rerank(&self, model_ref: &ModelRef) -> LlmResult<RerankProvider> {
        let mut cache = self
            .rerankers
            .lock()
            .map_err(|_| LlmError::config("provider registry lock poisoned"))?;

        if let Some(provider) = cache.get(model_ref) {
            return Ok(provider.clone());
        }

        let provider = RerankProvider::new(self.endpoint(model_ref.provider), &model_ref.model)?;
        cache.insert(model_ref.clone(), provider.clone());
        Ok(provider)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.api_keys.keys().collect::<Vec<_>>())
            .field("gateway", &self.gateway.is_some())
            .field("embedding_dimensions", &self.embedding_dimensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        let mut keys = HashMap::new();
        keys.insert(Provider::OpenAi, "sk-test".to_string());
        ProviderRegistry::new(keys, "http://localhost:11434/v1", None, 1536)
    }

    #[test]
    fn model_ref_parse() {
        let model_ref: ModelRef = "openai/gpt-4o-mini".parse().unwrap();
        assert_eq!(model_ref.provider, Provider::OpenAi);
        assert_eq!(model_ref.model, "gpt-4o-mini");
    }

    #[test]
    fn model_ref_display() {
        let model_ref = ModelRef::new(Provider::OpenRouter, "meta-llama/llama-3.3-70b");
        assert_eq!(model_ref.to_string(), "openrouter/meta-llama/llama-3.3-70b");
    }

    #[test]
    fn model_ref_invalid() {
        assert!("no-slash".parse::<ModelRef>().is_err());
        assert!("mystery/model".parse::<ModelRef>().is_err());
    }

    #[test]
    fn completion_clients_are_memoized() {
        let registry = registry();
        let model_ref = ModelRef::new(Provider::OpenAi, "gpt-4o-mini");

        let first = registry.completion(&model_ref).unwrap();
        let second = registry.completion(&model_ref).unwrap();
        // Same Arc-backed client both times.
        assert_eq!(first.model_name(), second.model_name());
        assert_eq!(registry.completions.lock().unwrap().len(), 1);
    }

    #[test]
    fn local_endpoint_uses_local_base_url() {
        let registry = registry();
        let endpoint = registry.endpoint(Provider::Local);
        assert_eq!(endpoint.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn gateway_applies_to_hosted_only() {
        let mut keys = HashMap::new();
        keys.insert(Provider::OpenAi, "sk-test".to_string());
        let registry = ProviderRegistry::new(
            keys,
            "http://localhost:11434/v1",
            Some(GatewayConfig::new("https://gw.example.com/v1", "gw")),
            1536,
        );

        assert_eq!(
            registry.endpoint(Provider::OpenAi).base_url,
            "https://gw.example.com/v1"
        );
        assert_eq!(
            registry.endpoint(Provider::Local).base_url,
            "http://localhost:11434/v1"
        );
    }
}
