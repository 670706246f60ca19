use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{
    CloudSpec, Embedder, EmbedderError, IndexConfig, VectorStore, VectorStoreError,
};

use super::{CorpusError, CorpusLoader};

/// Which indexes are removed before an index is (re)created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetScope {
    /// Every index in the account.
    #[default]
    Account,
    /// Only the index being created.
    Index,
}

/// Builds a vector index from a corpus directory.
pub struct IngestionService {
    corpus_loader: Arc<CorpusLoader>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    cloud: CloudSpec,
    reset_scope: ResetScope,
    embed_batch_size: usize,
}

impl IngestionService {
    pub fn new(
        corpus_loader: Arc<CorpusLoader>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        cloud: CloudSpec,
        reset_scope: ResetScope,
        embed_batch_size: usize,
    ) -> Self {
        Self {
            corpus_loader,
            embedder,
            vector_store,
            cloud,
            reset_scope,
            embed_batch_size: embed_batch_size.max(1),
        }
    }

    /// Resets the account (or just `index_name`) and creates a fresh cosine index.
    ///
    /// Deletion failures are logged and ignored; creation failures are returned.
    #[tracing::instrument(skip(self), fields(scope = ?self.reset_scope))]
    pub async fn create_index(
        &self,
        index_name: &str,
        dimension: u64,
    ) -> Result<(), IngestionError> {
        self.reset(index_name).await;

        let config = IndexConfig::new(dimension, self.cloud.clone());
        let created = self
            .vector_store
            .create_index(index_name, &config)
            .await
            .map_err(IngestionError::Storage)?;

        if created {
            tracing::info!(index = %index_name, "Index created");
        } else {
            tracing::info!(index = %index_name, "Index already present, kept as is");
        }
        Ok(())
    }

    async fn reset(&self, index_name: &str) {
        let targets = match self.reset_scope {
            ResetScope::Index => vec![index_name.to_string()],
            ResetScope::Account => match self.vector_store.list_indexes().await {
                Ok(names) => names,
                Err(e) => {
                    tracing::warn!(error = %e, "Listing indexes failed, nothing deleted");
                    return;
                }
            },
        };

        tracing::info!(count = targets.len(), "Deleting indexes");
        for name in targets {
            match self.vector_store.delete_index(&name).await {
                Ok(()) => tracing::info!(index = %name, "Index deleted"),
                Err(e) => tracing::warn!(index = %name, error = %e, "Index deletion failed"),
            }
        }
    }

    /// Loads, embeds and upserts the corpus under `dir`. Returns the chunk count.
    #[tracing::instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn create_vector_store(
        &self,
        dir: &Path,
        index_name: &str,
    ) -> Result<usize, IngestionError> {
        let chunks = self.corpus_loader.load(dir).await?;

        if chunks.is_empty() {
            tracing::warn!("Corpus produced no chunks, nothing to upsert");
            return Ok(0);
        }

        tracing::info!(chunks = chunks.len(), index = %index_name, "Embedding and upserting chunks");

        for batch in chunks.chunks(self.embed_batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self
                .embedder
                .embed_batch(&texts)
                .await
                .map_err(IngestionError::Embedding)?;

            if embeddings.len() != batch.len() {
                return Err(IngestionError::Embedding(EmbedderError::InvalidResponse(
                    format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    ),
                )));
            }

            self.vector_store
                .upsert(index_name, batch, &embeddings)
                .await
                .map_err(IngestionError::Storage)?;
        }

        tracing::info!(chunks = chunks.len(), index = %index_name, "Vector store ready");
        Ok(chunks.len())
    }

    /// Destructive full rebuild: `create_index` followed by `create_vector_store`.
    pub async fn rebuild(
        &self,
        dir: &Path,
        index_name: &str,
        dimension: u64,
    ) -> Result<usize, IngestionError> {
        self.create_index(index_name, dimension).await?;
        self.create_vector_store(dir, index_name).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("corpus: {0}")]
    Corpus(#[from] CorpusError),
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("storage: {0}")]
    Storage(VectorStoreError),
}
