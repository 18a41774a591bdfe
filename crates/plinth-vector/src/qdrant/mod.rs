//! Qdrant backend.

mod backend;

pub use backend::QdrantBackend;
