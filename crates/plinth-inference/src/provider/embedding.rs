//! Embedding provider.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET;
use crate::client::{EmbeddingRequest, LlmClient};
use crate::error::{LlmError, LlmResult};
use crate::provider::EndpointConfig;

/// Default maximum documents per embedding request.
///
/// This is a conservative default; individual providers may support more.
pub const DEFAULT_MAX_DOCUMENTS: usize = 96;

/// Embedding provider bound to one `(endpoint, model)` pair.
///
/// Cheaply cloneable. Every returned vector is validated against the
/// requested dimensionality; a mismatch is an error, never repaired by
/// truncation or padding.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: Arc<EmbeddingInner>,
}

struct EmbeddingInner {
    client: LlmClient,
    model: String,
    dimensions: usize,
}

impl EmbeddingProvider {
    /// Creates an embedding provider for an endpoint, model, and dimension.
    pub fn new(
        endpoint: EndpointConfig,
        model: impl Into<String>,
        dimensions: usize,
    ) -> LlmResult<Self> {
        if dimensions == 0 {
            return Err(LlmError::config("embedding dimensions must be non-zero"));
        }

        let client = LlmClient::new(endpoint)?;
        Ok(Self {
            inner: Arc::new(EmbeddingInner {
                client,
                model: model.into(),
                dimensions,
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

    /// Returns the configured dimensionality.
    pub fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    /// Embeds a single text.
    pub async fn embed_text(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<Vec<f32>> {
        let mut vectors = self.embed_texts(vec![text.to_string()], cancel).await?;
        vectors
            .pop()
            .ok_or_else(|| LlmError::parse("provider returned no embedding"))
    }

    /// Embeds multiple texts, batching requests as needed.
    ///
    /// Results are returned in input order. Any vector whose length differs
    /// from the configured dimensionality fails the whole call.
    pub async fn embed_texts(
        &self,
        texts: Vec<String>,
        cancel: &CancellationToken,
    ) -> LlmResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(texts.len());

        for batch in texts.chunks(DEFAULT_MAX_DOCUMENTS) {
            let request = EmbeddingRequest {
                model: self.inner.model.clone(),
                input: batch.to_vec(),
                dimensions: Some(self.inner.dimensions as u32),
            };

            let response = self.inner.client.embed(&request, cancel).await?;

            if response.data.len() != batch.len() {
                return Err(LlmError::parse(format!(
                    "provider returned {} embeddings for {} inputs",
                    response.data.len(),
                    batch.len()
                )));
            }

            let mut batch_vectors = response.data;
            batch_vectors.sort_by_key(|d| d.index);

            for datum in batch_vectors {
                if datum.embedding.len() != self.inner.dimensions {
                    return Err(LlmError::Dimension {
                        expected: self.inner.dimensions,
                        actual: datum.embedding.len(),
                    });
                }
                vectors.push(datum.embedding);
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            model = %self.inner.model,
            count = vectors.len(),
            "Embedded documents"
        );

        Ok(vectors)
    }
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.inner.model)
            .field("ndims", &self.inner.dimensions)
            .finish()
    }
}
