use async_trait::async_trait;

use super::{IndexConfig, SearchResult, VectorStoreError};
use crate::domain::{Chunk, Embedding};

/// A remote account holding named vector indexes.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError>;

    async fn index_exists(&self, index: &str) -> Result<bool, VectorStoreError>;

    /// Creates `index` unless it already exists. Returns whether it was created.
    async fn create_index(&self, index: &str, config: &IndexConfig)
    -> Result<bool, VectorStoreError>;

    async fn delete_index(&self, index: &str) -> Result<(), VectorStoreError>;

    async fn upsert(
        &self,
        index: &str,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError>;

    /// Nearest neighbours of `embedding`, best first, with stored vectors attached.
    async fn search(
        &self,
        index: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError>;
}
