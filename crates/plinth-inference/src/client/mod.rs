//! OpenAI-compatible wire client.
//!
//! One client speaks the wire protocol shared by the hosted API, the
//! OpenAI-compatible routers, and local inference bindings; the provider
//! paths differ only in endpoint configuration.

mod sse;
mod wire;

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

pub use sse::{TokenEvent, TokenStream};
pub use wire::{
    AssistantMessage, ChatChoice, ChatMessage, ChatRequest, ChatResponse, ContentPart,
    EmbeddingData, EmbeddingRequest, EmbeddingResponse, ImageUrl, MessageContent, RerankRequest,
    RerankResponse, RerankResult, Role, StreamOptions, WireUsage,
};

use crate::TRACING_TARGET;
use crate::error::{LlmError, LlmResult};
use crate::provider::EndpointConfig;

/// OpenAI-compatible API client.
///
/// This is a cheaply cloneable wrapper around an `Arc` of the HTTP client
/// and endpoint configuration.
#[derive(Clone)]
pub struct LlmClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    endpoint: EndpointConfig,
}

impl LlmClient {
    /// Creates a new client for an endpoint.
    pub fn new(endpoint: EndpointConfig) -> LlmResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(LlmError::Transport)?;

        Ok(Self {
            inner: Arc::new(ClientInner { http, endpoint }),
        })
    }

    /// Returns the provider name of this client's endpoint.
    pub fn provider_name(&self) -> &'static str {
        self.inner.endpoint.provider.as_str()
    }

    /// Returns the endpoint configuration.
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.inner.endpoint
    }

    /// Sends a non-streaming chat completion request.
    pub async fn chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<ChatResponse> {
        self.post_json("/chat/completions", request, cancel).await
    }

    /// Sends a streaming chat completion request.
    ///
    /// The returned stream yields token deltas and exactly one terminal
    /// [`TokenEvent::Done`] carrying usage and the finish reason.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<TokenStream> {
        let mut request = request.clone();
        request.stream = Some(true);
        request.stream_options = Some(StreamOptions {
            include_usage: true,
        });

        let response = self.post_raw("/chat/completions", &request, cancel).await?;

        Ok(sse::parse_sse_stream(
            response,
            self.provider_name().to_string(),
            cancel.clone(),
        ))
    }

    /// Sends an embedding request.
    pub async fn embed(
        &self,
        request: &EmbeddingRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<EmbeddingResponse> {
        self.post_json("/embeddings", request, cancel).await
    }

    /// Sends a cross-encoder rerank request.
    pub async fn rerank(
        &self,
        request: &RerankRequest,
        cancel: &CancellationToken,
    ) -> LlmResult<RerankResponse> {
        self.post_json("/rerank", request, cancel).await
    }

    /// Posts a JSON body and deserializes a JSON response.
    async fn post_json<B, R>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> LlmResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.post_raw(path, body, cancel).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| LlmError::parse(format!("invalid response body: {e}")))
    }

    /// Posts a JSON body and returns the raw response after status checking.
    async fn post_raw<B>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> LlmResult<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let endpoint = &self.inner.endpoint;
        let url = format!("{}{}", endpoint.base_url.trim_end_matches('/'), path);

        let mut request = self.inner.http.post(&url).json(body);
        if let Some(ref api_key) = endpoint.api_key {
            request = request.bearer_auth(api_key);
        }
        for (name, value) in &endpoint.headers {
            request = request.header(name, value);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            provider = %self.provider_name(),
            url = %url,
            "Sending provider request"
        );

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(LlmError::Cancelled),
            result = request.send() => result.map_err(LlmError::Transport)?,
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::api(self.provider_name(), status.as_u16(), message));
        }

        Ok(response)
    }
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider_name())
            .field("base_url", &self.inner.endpoint.base_url)
            .finish()
    }
}
