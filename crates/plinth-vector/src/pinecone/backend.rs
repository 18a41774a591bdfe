//! Pinecone backend implementation.
//!
//! Pinecone supports namespaces natively, so tenant isolation maps directly
//! onto one namespace per agent within a single index.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use pinecone_sdk::models::{Kind, Metadata, Namespace, Value as PineconeValue, Vector};
use pinecone_sdk::pinecone::PineconeClientConfig;
use pinecone_sdk::pinecone::data::Index;
use tokio::sync::Mutex;

use super::super::config::PineconeConfig;
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{QueryOptions, VectorIndexBackend, VectorQueryResult, VectorRecord};

/// Pinecone backend implementation.
pub struct PineconeBackend {
    index: Mutex<Index>,
    #[allow(dead_code)]
    config: PineconeConfig,
}

impl PineconeBackend {
    /// Creates a new Pinecone backend.
    pub async fn new(config: &PineconeConfig) -> VectorResult<Self> {
        let client_config = PineconeClientConfig {
            api_key: Some(config.api_key.clone()),
            ..Default::default()
        };

        let client = client_config
            .client()
            .map_err(|e| VectorError::connection(e.to_string()))?;

        let index_description = client
            .describe_index(&config.index)
            .await
            .map_err(|e| VectorError::connection(format!("failed to describe index: {e}")))?;

        let host = &index_description.host;

        let index = client
            .index(host)
            .await
            .map_err(|e| VectorError::connection(format!("failed to connect to index: {e}")))?;

        tracing::debug!(
            target: TRACING_TARGET,
            index = %config.index,
            "Connected to Pinecone"
        );

        Ok(Self {
            index: Mutex::new(index),
            config: config.clone(),
        })
    }

    /// Converts Pinecone metadata (prost struct) to a HashMap.
    fn metadata_to_hashmap(metadata: Metadata) -> HashMap<String, serde_json::Value> {
        metadata
            .fields
            .into_iter()
            .map(|(k, v)| (k, pinecone_value_to_json(v)))
            .collect()
    }

    /// Converts a HashMap to Pinecone metadata (prost struct).
    fn hashmap_to_metadata(map: HashMap<String, serde_json::Value>) -> Metadata {
        let fields: BTreeMap<String, PineconeValue> = map
            .into_iter()
            .map(|(k, v)| (k, json_to_pinecone_value(v)))
            .collect();

        Metadata { fields }
    }
}

#[async_trait]
impl VectorIndexBackend for PineconeBackend {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> VectorResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let namespace = Namespace::from(namespace);

        let vectors: Vec<Vector> = records
            .into_iter()
            .map(|r| {
                let metadata = if r.metadata.is_empty() {
                    None
                } else {
                    Some(Self::hashmap_to_metadata(r.metadata))
                };

                Vector {
                    id: r.id,
                    values: r.vector,
                    sparse_values: None,
                    metadata,
                }
            })
            .collect();

        let mut index = self.index.lock().await;
        index
            .upsert(&vectors, &namespace)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        limit: usize,
        options: QueryOptions,
    ) -> VectorResult<Vec<VectorQueryResult>> {
        let namespace = Namespace::from(namespace);

        let mut index = self.index.lock().await;
        let response = index
            .query_by_value(
                vector,
                None, // sparse values
                limit as u32,
                &namespace,
                None, // filter
                Some(false),
                Some(options.include_metadata),
            )
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        let results = response
            .matches
            .into_iter()
            .map(|m| {
                let metadata = m
                    .metadata
                    .map(Self::metadata_to_hashmap)
                    .unwrap_or_default();

                VectorQueryResult {
                    id: m.id,
                    score: m.score,
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }

    async fn delete(&self, namespace: &str, ids: Vec<String>) -> VectorResult<()> {
        let namespace = Namespace::from(namespace);
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let mut index = self.index.lock().await;
        index
            .delete_by_id(&id_refs, &namespace)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }

    async fn delete_namespace(&self, namespace: &str) -> VectorResult<()> {
        let namespace = Namespace::from(namespace);

        let mut index = self.index.lock().await;
        index
            .delete_all(&namespace)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }
}

/// Converts a Pinecone value (prost) to a JSON value.
fn pinecone_value_to_json(value: PineconeValue) -> serde_json::Value {
    match value.kind {
        Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::NumberValue(n)) => serde_json::Value::Number(
            serde_json::Number::from_f64(n).unwrap_or(serde_json::Number::from(0)),
        ),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::StructValue(s)) => {
            let map: serde_json::Map<String, serde_json::Value> = s
                .fields
                .into_iter()
                .map(|(k, v)| (k, pinecone_value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        Some(Kind::ListValue(list)) => {
            let arr: Vec<serde_json::Value> = list
                .values
                .into_iter()
                .map(pinecone_value_to_json)
                .collect();
            serde_json::Value::Array(arr)
        }
        None => serde_json::Value::Null,
    }
}

/// Converts a JSON value to a Pinecone value (prost).
fn json_to_pinecone_value(value: serde_json::Value) -> PineconeValue {
    let kind = match value {
        serde_json::Value::Null => Some(Kind::NullValue(0)),
        serde_json::Value::Bool(b) => Some(Kind::BoolValue(b)),
        serde_json::Value::Number(n) => Some(Kind::NumberValue(n.as_f64().unwrap_or(0.0))),
        serde_json::Value::String(s) => Some(Kind::StringValue(s)),
        serde_json::Value::Array(arr) => Some(Kind::ListValue(prost_types::ListValue {
            values: arr.into_iter().map(json_to_pinecone_value).collect(),
        })),
        serde_json::Value::Object(obj) => {
            let fields: BTreeMap<String, PineconeValue> = obj
                .into_iter()
                .map(|(k, v)| (k, json_to_pinecone_value(v)))
                .collect();
            Some(Kind::StructValue(prost_types::Struct { fields }))
        }
    };

    PineconeValue { kind }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_round_trip() {
        let mut map = HashMap::new();
        map.insert("sourceId".to_string(), serde_json::json!("src-1"));
        map.insert("chunkIndex".to_string(), serde_json::json!(7.0));

        let metadata = PineconeBackend::hashmap_to_metadata(map.clone());
        let back = PineconeBackend::metadata_to_hashmap(metadata);
        assert_eq!(map, back);
    }
}
