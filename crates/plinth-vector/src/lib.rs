#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod pinecone;
pub mod qdrant;

mod config;
mod error;
mod store;

pub use config::{PineconeConfig, QdrantConfig, VectorIndexConfig};
pub use error::{VectorError, VectorResult};
pub use store::{
    QueryOptions, VectorIndex, VectorIndexBackend, VectorQueryResult, VectorRecord,
};

/// Tracing target for vector index operations.
pub const TRACING_TARGET: &str = "plinth_vector";
