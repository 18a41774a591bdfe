//! Qdrant backend implementation.
//!
//! Namespaces are realized as one collection per namespace, named
//! `{collection_prefix}_{namespace}`, so tenant isolation holds at the
//! collection level.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfig;
use qdrant_client::qdrant::with_payload_selector::SelectorOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, PointId, PointStruct,
    PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};

use super::super::config::QdrantConfig;
use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};
use crate::store::{QueryOptions, VectorIndexBackend, VectorQueryResult, VectorRecord};

/// Qdrant backend implementation.
pub struct QdrantBackend {
    client: Qdrant,
    config: QdrantConfig,
    dimensions: usize,
}

impl QdrantBackend {
    /// Creates a new Qdrant backend.
    pub async fn new(config: &QdrantConfig, dimensions: usize) -> VectorResult<Self> {
        let client = Qdrant::from_url(&config.url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| VectorError::connection(e.to_string()))?;

        tracing::debug!(
            target: TRACING_TARGET,
            url = %config.url,
            "Connected to Qdrant"
        );

        Ok(Self {
            client,
            config: config.clone(),
            dimensions,
        })
    }

    fn collection_name(&self, namespace: &str) -> String {
        format!("{}_{}", self.config.collection_prefix, namespace)
    }

    /// Ensures a namespace collection exists, creating it if necessary.
    async fn ensure_collection(&self, name: &str) -> VectorResult<()> {
        let exists = self
            .client
            .collection_exists(name)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        if !exists {
            let vectors_config = VectorsConfig::Params(
                VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine).build(),
            );

            self.client
                .create_collection(
                    CreateCollectionBuilder::new(name).vectors_config(vectors_config),
                )
                .await
                .map_err(|e| VectorError::backend(e.to_string()))?;

            tracing::info!(
                target: TRACING_TARGET,
                collection = %name,
                dimensions = %self.dimensions,
                "Created Qdrant collection"
            );
        }

        Ok(())
    }

    /// Extracts a point ID as a string.
    fn extract_point_id(id: Option<PointId>) -> Option<String> {
        use qdrant_client::qdrant::point_id::PointIdOptions;

        match id {
            Some(PointId {
                point_id_options: Some(id),
            }) => match id {
                PointIdOptions::Num(n) => Some(n.to_string()),
                PointIdOptions::Uuid(s) => Some(s),
            },
            _ => None,
        }
    }
}

#[async_trait]
impl VectorIndexBackend for QdrantBackend {
    async fn upsert(&self, namespace: &str, records: Vec<VectorRecord>) -> VectorResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let collection = self.collection_name(namespace);
        self.ensure_collection(&collection).await?;

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|r| {
                let payload: HashMap<String, qdrant_client::qdrant::Value> = r
                    .metadata
                    .into_iter()
                    .map(|(k, v)| (k, json_to_qdrant_value(v)))
                    .collect();

                PointStruct::new(r.id, r.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&collection, points))
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
        let collection = self.collection_name(namespace);

        let exists = self
            .client
            .collection_exists(&collection)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;
        if !exists {
            return Ok(vec![]);
        }

        let mut search = SearchPointsBuilder::new(&collection, vector, limit as u64);
        if options.include_metadata {
            search = search.with_payload(SelectorOptions::Enable(true));
        }

        let response = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let id = Self::extract_point_id(point.id).unwrap_or_default();
                let metadata: HashMap<String, serde_json::Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, qdrant_value_to_json(v)))
                    .collect();

                VectorQueryResult {
                    id,
                    score: point.score,
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }

    async fn delete(&self, namespace: &str, ids: Vec<String>) -> VectorResult<()> {
        let collection = self.collection_name(namespace);

        let exists = self
            .client
            .collection_exists(&collection)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;
        if !exists {
            return Ok(());
        }

        let point_ids: Vec<PointId> = ids.into_iter().map(PointId::from).collect();

        self.client
            .delete_points(
                DeletePointsBuilder::new(&collection)
                    .points(PointsIdsList { ids: point_ids })
                    .wait(true),
            )
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }

    async fn delete_namespace(&self, namespace: &str) -> VectorResult<()> {
        let collection = self.collection_name(namespace);

        let exists = self
            .client
            .collection_exists(&collection)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;
        if !exists {
            return Ok(());
        }

        self.client
            .delete_collection(&collection)
            .await
            .map_err(|e| VectorError::backend(e.to_string()))?;

        Ok(())
    }
}

/// Converts a JSON value to a Qdrant value.
fn json_to_qdrant_value(value: serde_json::Value) -> qdrant_client::qdrant::Value {
    use qdrant_client::qdrant::value::Kind;

    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Kind::IntegerValue(i)
            } else if let Some(f) = n.as_f64() {
                Kind::DoubleValue(f)
            } else {
                Kind::StringValue(n.to_string())
            }
        }
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(arr) => {
            let values: Vec<qdrant_client::qdrant::Value> =
                arr.into_iter().map(json_to_qdrant_value).collect();
            Kind::ListValue(qdrant_client::qdrant::ListValue { values })
        }
        serde_json::Value::Object(obj) => {
            let fields: HashMap<String, qdrant_client::qdrant::Value> = obj
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant_value(v)))
                .collect();
            Kind::StructValue(qdrant_client::qdrant::Struct { fields })
        }
    };

    qdrant_client::qdrant::Value { kind: Some(kind) }
}

/// Converts a Qdrant value to a JSON value.
fn qdrant_value_to_json(value: qdrant_client::qdrant::Value) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind;

    match value.kind {
        Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::json!(i),
        Some(Kind::DoubleValue(f)) => serde_json::json!(f),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            let arr: Vec<serde_json::Value> =
                list.values.into_iter().map(qdrant_value_to_json).collect();
            serde_json::Value::Array(arr)
        }
        Some(Kind::StructValue(obj)) => {
            let map: serde_json::Map<String, serde_json::Value> = obj
                .fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
        None => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let value = serde_json::json!({
            "sourceId": "a3c1",
            "chunkIndex": 4,
            "nested": {"flag": true},
        });

        let qdrant = json_to_qdrant_value(value.clone());
        let back = qdrant_value_to_json(qdrant);
        assert_eq!(value, back);
    }
}
