use std::sync::Arc;

use crate::application::ports::{Embedder, SearchResult, VectorStore};
use crate::domain::Embedding;

use super::RetrievalError;
use super::mmr::maximal_marginal_relevance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchType {
    Similarity,
    Mmr { fetch_k: usize, lambda_mult: f32 },
}

/// Looks up the chunks of one named index that best answer a query.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    index_name: String,
    k: usize,
    search_type: SearchType,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        index_name: String,
        k: usize,
        search_type: SearchType,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            index_name,
            k,
            search_type,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    #[tracing::instrument(skip(self, query), fields(index = %self.index_name, k = self.k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(RetrievalError::Embedding)?;

        match self.search_type {
            SearchType::Similarity => {
                let results = self
                    .vector_store
                    .search(&self.index_name, &query_embedding, self.k)
                    .await?;
                Ok(results)
            }
            SearchType::Mmr {
                fetch_k,
                lambda_mult,
            } => {
                let candidates = self
                    .vector_store
                    .search(&self.index_name, &query_embedding, fetch_k.max(self.k))
                    .await?;
                Ok(self.select_diverse(&query_embedding, candidates, lambda_mult))
            }
        }
    }

    fn select_diverse(
        &self,
        query: &Embedding,
        candidates: Vec<SearchResult>,
        lambda_mult: f32,
    ) -> Vec<SearchResult> {
        let (with_vectors, without_vectors): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|candidate| candidate.embedding.is_some());

        if !without_vectors.is_empty() {
            tracing::warn!(
                missing = without_vectors.len(),
                "Search candidates returned without vectors, ranking them by score only"
            );
        }

        let vectors: Vec<Embedding> = with_vectors
            .iter()
            .filter_map(|candidate| candidate.embedding.clone())
            .collect();
        let order = maximal_marginal_relevance(query, &vectors, self.k, lambda_mult);

        let mut slots: Vec<Option<SearchResult>> = with_vectors.into_iter().map(Some).collect();
        let mut selected: Vec<SearchResult> = order
            .into_iter()
            .filter_map(|position| slots[position].take())
            .collect();

        let shortfall = self.k.saturating_sub(selected.len());
        selected.extend(without_vectors.into_iter().take(shortfall));

        tracing::debug!(selected = selected.len(), "MMR selection complete");
        selected
    }
}
