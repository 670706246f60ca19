use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{IndexConfig, SearchResult, VectorStore, VectorStoreError};
use crate::domain::{Chunk, ChunkId, Embedding};

struct MemoryIndex {
    dimension: u64,
    points: Vec<(Chunk, Embedding)>,
}

/// Process-local indexes searched by brute-force cosine similarity.
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryVectorStore {
    indexes: RwLock<HashMap<String, MemoryIndex>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn point_count(&self, index: &str) -> Option<usize> {
        self.indexes
            .read()
            .await
            .get(index)
            .map(|memory| memory.points.len())
    }

    pub async fn contains(&self, index: &str, id: ChunkId) -> bool {
        self.indexes
            .read()
            .await
            .get(index)
            .is_some_and(|memory| memory.points.iter().any(|(chunk, _)| chunk.id == id))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn index_exists(&self, index: &str) -> Result<bool, VectorStoreError> {
        Ok(self.indexes.read().await.contains_key(index))
    }

    async fn create_index(
        &self,
        index: &str,
        config: &IndexConfig,
    ) -> Result<bool, VectorStoreError> {
        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(index) {
            return Ok(false);
        }
        indexes.insert(
            index.to_string(),
            MemoryIndex {
                dimension: config.dimension,
                points: Vec::new(),
            },
        );
        Ok(true)
    }

    async fn delete_index(&self, index: &str) -> Result<(), VectorStoreError> {
        self.indexes.write().await.remove(index);
        Ok(())
    }

    async fn upsert(
        &self,
        index: &str,
        chunks: &[Chunk],
        embeddings: &[Embedding],
    ) -> Result<(), VectorStoreError> {
        if chunks.len() != embeddings.len() {
            return Err(VectorStoreError::UpsertFailed(
                "chunks and embeddings count mismatch".to_string(),
            ));
        }

        let mut indexes = self.indexes.write().await;
        let memory = indexes
            .get_mut(index)
            .ok_or_else(|| VectorStoreError::IndexNotFound(index.to_string()))?;

        if let Some(bad) = embeddings
            .iter()
            .find(|e| e.dimensions() as u64 != memory.dimension)
        {
            return Err(VectorStoreError::UpsertFailed(format!(
                "expected dimension {}, got {}",
                memory.dimension,
                bad.dimensions()
            )));
        }

        for (chunk, embedding) in chunks.iter().zip(embeddings.iter()) {
            let existing = memory
                .points
                .iter_mut()
                .find(|(stored, _)| stored.id == chunk.id);
            match existing {
                Some(point) => *point = (chunk.clone(), embedding.clone()),
                None => memory.points.push((chunk.clone(), embedding.clone())),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let indexes = self.indexes.read().await;
        let memory = indexes
            .get(index)
            .ok_or_else(|| VectorStoreError::IndexNotFound(index.to_string()))?;

        let mut scored: Vec<SearchResult> = memory
            .points
            .iter()
            .map(|(chunk, stored)| SearchResult {
                chunk: chunk.clone(),
                score: stored.cosine_similarity(embedding),
                embedding: Some(stored.clone()),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }
}
