//! Vector index configuration types.

use serde::{Deserialize, Serialize};

/// Qdrant connection configuration.
///
/// Namespaces map to per-namespace collections named
/// `{collection_prefix}_{namespace}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QdrantConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Prefix for per-namespace collection names.
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
}

fn default_collection_prefix() -> String {
    "plinth".to_string()
}

/// Pinecone connection configuration.
///
/// Namespaces map to native Pinecone namespaces within one index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PineconeConfig {
    /// Pinecone API key.
    pub api_key: String,
    /// Name of the Pinecone index.
    pub index: String,
}

/// Vector index backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum VectorIndexConfig {
    /// Qdrant vector database.
    Qdrant(QdrantConfig),
    /// Pinecone managed vector database.
    Pinecone(PineconeConfig),
}

impl VectorIndexConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Qdrant(_) => "qdrant",
            Self::Pinecone(_) => "pinecone",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names() {
        let config = VectorIndexConfig::Qdrant(QdrantConfig {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection_prefix: "plinth".to_string(),
        });
        assert_eq!(config.backend_name(), "qdrant");
    }

    #[test]
    fn config_round_trip() {
        let config = VectorIndexConfig::Pinecone(PineconeConfig {
            api_key: "key".to_string(),
            index: "knowledge".to_string(),
        });
        let json = serde_json::to_string(&config).unwrap();
        let back: VectorIndexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
