//! Completion provider.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::client::{ChatMessage, ChatRequest, LlmClient, TokenStream};
use crate::error::{LlmError, LlmResult};
use crate::provider::EndpointConfig;
use crate::structured::parse_structured;
use crate::usage::UsageStats;

/// Sampling parameters for a completion call.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenParams {
    /// Sampling temperature.
    pub temperature: Option<f64>,
    /// Nucleus sampling parameter.
    pub top_p: Option<f64>,
    /// Maximum completion tokens.
    pub max_tokens: Option<u32>,
}

/// Completion provider bound to one `(endpoint, model)` pair.
///
/// This is a cheaply cloneable wrapper around an `Arc` of the client and
/// model name.
#[derive(Clone)]
pub struct CompletionProvider {
    inner: Arc<CompletionInner>,
}

struct CompletionInner {
    client: LlmClient,
    model: String,
}

impl CompletionProvider {
    /// Creates a completion provider for an endpoint and model.
    pub fn new(endpoint: EndpointConfig, model: impl Into<String>) -> LlmResult<Self> {
        let client = LlmClient::new(endpoint)?;
        Ok(Self {
            inner: Arc::new(CompletionInner {
                client,
                model: model.into(),
            }),
        })
    }

    /// Returns the model name.
    pub fn model_name(&self) -> &str {
        &self.inner.model
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        self.inner.client.provider_name()
    }

    /// Sends a non-streaming completion and returns the text with usage.
    pub async fn complete(
        &self,
        system: Option<&str>,
        messages: Vec<ChatMessage>,
        params: GenParams,
        cancel: &CancellationToken,
    ) -> LlmResult<(String, UsageStats)> {
        let request = self.build_request(system, messages, params);
        let response = self.inner.client.chat(&request, cancel).await?;

        let usage = response.usage.clone().map(Into::into).unwrap_or_default();
        Ok((response.text(), usage))
    }

    /// Sends a single-prompt completion; convenience for pipeline stages.
    pub async fn complete_prompt(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<String> {
        let (text, _usage) = self
            .complete(
                None,
                vec![ChatMessage::user(prompt)],
                GenParams::default(),
                cancel,
            )
            .await?;
        Ok(text)
    }

    /// Streams a completion as token events.
    pub async fn stream(
        &self,
        system: Option<&str>,
        messages: Vec<ChatMessage>,
        params: GenParams,
        cancel: &CancellationToken,
    ) -> LlmResult<TokenStream> {
        let request = self.build_request(system, messages, params);
        self.inner.client.chat_stream(&request, cancel).await
    }

    /// Generates a small structured JSON output.
    ///
    /// The JSON schema of `T` is embedded in the prompt and the response is
    /// parsed tolerantly: leading and trailing code-fence markers are
    /// stripped before deserialization.
    pub async fn generate_structured<T>(
        &self,
        instructions: &str,
        input: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<T>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let schema = schemars::schema_for!(T);
        let schema_json = serde_json::to_string_pretty(&schema)
            .map_err(|e| LlmError::parse(format!("failed to render schema: {e}")))?;

        let prompt = format!(
            "{instructions}\n\n\
             Respond with a single JSON object matching this schema. \
             Output only valid JSON, no explanations or markdown formatting.\n\n\
             Schema:\n{schema_json}\n\nInput:\n{input}"
        );

        let raw = self.complete_prompt(&prompt, cancel).await?;
        parse_structured(&raw)
    }

    fn build_request(
        &self,
        system: Option<&str>,
        messages: Vec<ChatMessage>,
        params: GenParams,
    ) -> ChatRequest {
        let mut all_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system {
            all_messages.push(ChatMessage::system(system));
        }
        all_messages.extend(messages);

        let mut request = ChatRequest::new(&self.inner.model, all_messages);
        request.temperature = params.temperature;
        request.top_p = params.top_p;
        request.max_tokens = params.max_tokens;
        request
    }
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.inner.model)
            .finish()
    }
}
