//! Vector index trait and facade.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::config::VectorIndexConfig;
use crate::error::{VectorError, VectorResult};
use crate::pinecone::PineconeBackend;
use crate::qdrant::QdrantBackend;

/// A vector to be stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique identifier for the vector (the chunk id).
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Lightweight metadata; chunk text never lives here.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl VectorRecord {
    /// Creates a new record with an ID and embedding.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            metadata: HashMap::new(),
        }
    }

    /// Adds a single metadata field.
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Result of a similarity query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorQueryResult {
    /// Vector ID.
    pub id: String,
    /// Similarity score (cosine, higher is more similar).
    pub score: f32,
    /// Associated metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Query options.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Include metadata in results.
    pub include_metadata: bool,
}

impl QueryOptions {
    /// Creates default query options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Include metadata in results.
    pub fn with_metadata(mut self) -> Self {
        self.include_metadata = true;
        self
    }
}

/// Trait for vector index backends.
///
/// All operations are scoped to a `namespace` — the per-agent partition.
#[async_trait]
pub trait VectorIndexBackend: Send + Sync {
    /// Upserts vectors into a namespace.
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> VectorResult<()>;

    /// Queries a namespace for the most similar vectors.
    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        limit: usize,
        options: QueryOptions,
    ) -> VectorResult<Vec<VectorQueryResult>>;

    /// Deletes vectors by their IDs within a namespace.
    async fn delete(&self, namespace: &str, ids: Vec<String>) -> VectorResult<()>;

    /// Deletes an entire namespace.
    async fn delete_namespace(&self, namespace: &str) -> VectorResult<()>;
}

/// Unified vector index that wraps backend implementations.
///
/// Validates the dimensionality of every vector before it reaches a backend;
/// a mismatch is fatal and is never repaired by truncation or padding.
pub struct VectorIndex {
    config: VectorIndexConfig,
    dimensions: usize,
    backend: Box<dyn VectorIndexBackend>,
}

impl VectorIndex {
    /// Creates a new vector index from configuration.
    pub async fn connect(config: VectorIndexConfig, dimensions: usize) -> VectorResult<Self> {
        let backend: Box<dyn VectorIndexBackend> = match &config {
            VectorIndexConfig::Qdrant(cfg) => {
                Box::new(QdrantBackend::new(cfg, dimensions).await?)
            }
            VectorIndexConfig::Pinecone(cfg) => Box::new(PineconeBackend::new(cfg).await?),
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = %config.backend_name(),
            dimensions = %dimensions,
            "Vector index initialized"
        );

        Ok(Self {
            config,
            dimensions,
            backend,
        })
    }

    /// Creates a vector index from an already-constructed backend.
    ///
    /// Used by tests to plug in in-memory backends.
    pub fn from_backend(
        config: VectorIndexConfig,
        dimensions: usize,
        backend: Box<dyn VectorIndexBackend>,
    ) -> Self {
        Self {
            config,
            dimensions,
            backend,
        }
    }

    /// Returns the configured dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Upserts vectors into a namespace.
    ///
    /// Fails with [`VectorError::Dimension`] if any vector's length differs
    /// from the configured dimensionality.
    pub async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> VectorResult<()> {
        for record in &records {
            if record.vector.len() != self.dimensions {
                return Err(VectorError::Dimension {
                    expected: self.dimensions,
                    actual: record.vector.len(),
                });
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            namespace = %namespace,
            count = %records.len(),
            "Upserting vectors"
        );
        self.backend.upsert(namespace, records).await
    }

    /// Queries a namespace for similar vectors.
    pub async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        limit: usize,
        options: QueryOptions,
    ) -> VectorResult<Vec<VectorQueryResult>> {
        if vector.len() != self.dimensions {
            return Err(VectorError::Dimension {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }

        self.backend.query(namespace, vector, limit, options).await
    }

    /// Deletes vectors by their IDs within a namespace.
    pub async fn delete(&self, namespace: &str, ids: Vec<String>) -> VectorResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            target: TRACING_TARGET,
            namespace = %namespace,
            count = %ids.len(),
            "Deleting vectors"
        );
        self.backend.delete(namespace, ids).await
    }

    /// Deletes an entire namespace.
    pub async fn delete_namespace(&self, namespace: &str) -> VectorResult<()> {
        tracing::debug!(
            target: TRACING_TARGET,
            namespace = %namespace,
            "Deleting namespace"
        );
        self.backend.delete_namespace(namespace).await
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("backend", &self.config.backend_name())
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::QdrantConfig;

    #[derive(Default)]
    struct RecordingBackend {
        upserted: Mutex<Vec<VectorRecord>>,
    }

    #[async_trait]
    impl VectorIndexBackend for RecordingBackend {
        async fn upsert(&self, _ns: &str, records: Vec<VectorRecord>) -> VectorResult<()> {
            self.upserted.lock().unwrap().extend(records);
            Ok(())
        }

        async fn query(
            &self,
            _ns: &str,
            _vector: Vec<f32>,
            _limit: usize,
            _options: QueryOptions,
        ) -> VectorResult<Vec<VectorQueryResult>> {
            Ok(vec![])
        }

        async fn delete(&self, _ns: &str, _ids: Vec<String>) -> VectorResult<()> {
            Ok(())
        }

        async fn delete_namespace(&self, _ns: &str) -> VectorResult<()> {
            Ok(())
        }
    }

    fn index(dimensions: usize) -> VectorIndex {
        VectorIndex::from_backend(
            VectorIndexConfig::Qdrant(QdrantConfig {
                url: "http://localhost:6334".to_string(),
                api_key: None,
                collection_prefix: "test".to_string(),
            }),
            dimensions,
            Box::new(RecordingBackend::default()),
        )
    }

    #[tokio::test]
    async fn upsert_validates_dimensions() {
        let index = index(3);

        let ok = index
            .upsert("agent-a", vec![VectorRecord::new("c1", vec![0.1, 0.2, 0.3])])
            .await;
        assert!(ok.is_ok());

        let err = index
            .upsert("agent-a", vec![VectorRecord::new("c2", vec![0.1, 0.2])])
            .await
            .unwrap_err();
        match err {
            VectorError::Dimension { expected, actual } => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected dimension error, got {other}"),
        }
    }

    #[tokio::test]
    async fn query_validates_dimensions() {
        let index = index(4);
        let err = index
            .query("agent-a", vec![0.5; 3], 5, QueryOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::Dimension { .. }));
    }

    #[tokio::test]
    async fn delete_empty_is_noop() {
        let index = index(4);
        assert!(index.delete("agent-a", vec![]).await.is_ok());
    }
}
