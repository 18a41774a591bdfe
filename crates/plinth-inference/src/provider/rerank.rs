//! Cross-encoder rerank provider.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::client::{LlmClient, RerankRequest};
use crate::error::LlmResult;
use crate::provider::EndpointConfig;

/// One reranked passage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RerankHit {
    /// Index into the passages given to [`RerankProvider::rerank`].
    pub index: usize,
    /// Cross-encoder relevance score.
    pub score: f64,
}

/// Rerank provider bound to one `(endpoint, model)` pair.
#[derive(Clone)]
pub struct RerankProvider {
    inner: Arc<RerankInner>,
}

struct RerankInner {
    client: LlmClient,
    model: String,
}

impl RerankProvider {
    /// Creates a rerank provider for an endpoint and model.
    pub fn new(endpoint: EndpointConfig, model: impl Into<String>) -> LlmResult<Self> {
        let client = LlmClient::new(endpoint)?;
        Ok(Self {
            inner: Arc::new(RerankInner {
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

    /// Scores `(query, passage)` pairs jointly and returns the top `top_k`
    /// passages by descending relevance.
    pub async fn rerank(
        &self,
        query: &str,
        passages: &[String],
        top_k: usize,
        cancel: &CancellationToken,
    ) -> LlmResult<Vec<RerankHit>> {
        if passages.is_empty() {
            return Ok(vec![]);
        }

        let request = RerankRequest {
            model: self.inner.model.clone(),
            query: query.to_string(),
            documents: passages.to_vec(),
            top_n: Some(top_k as u32),
        };

        let response = self.inner.client.rerank(&request, cancel).await?;

        let mut hits: Vec<RerankHit> = response
            .results
            .into_iter()
            .filter(|r| r.index < passages.len())
            .map(|r| RerankHit {
                index: r.index,
                score: r.relevance_score,
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);

        Ok(hits)
    }
}

impl std::fmt::Debug for RerankProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RerankProvider")
            .field("provider", &self.provider_name())
            .field("model", &self.inner.model)
            .finish()
    }
}
