use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::vectors_output::VectorsOptions;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, VectorsConfig,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::application::ports::{
    DistanceMetric, IndexConfig, SearchResult, VectorStore, VectorStoreError,
};
use crate::domain::{Chunk, ChunkId, Embedding};

/// Qdrant collections standing in for named indexes.
pub struct QdrantAdapter {
    client: Arc<Qdrant>,
}

impl QdrantAdapter {
    pub fn new(url: &str, api_key: Option<String>) -> Result<Self, VectorStoreError> {
        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .build()
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub fn with_client(client: Arc<Qdrant>) -> Self {
        Self { client }
    }

    fn map_distance_metric(metric: &DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
        }
    }

    /// Points without a `text` payload or with numeric ids are not chunks of ours.
    fn search_result_from_point(point: ScoredPoint) -> Option<SearchResult> {
        let text = point.payload.get("text")?.as_str()?.to_string();
        let chunk_index = point
            .payload
            .get("chunk_index")
            .and_then(|v| v.as_integer())
            .map(|v| v as usize)
            .unwrap_or_default();

        let id = match point.id?.point_id_options? {
            PointIdOptions::Uuid(uuid) => Uuid::parse_str(&uuid).ok()?,
            PointIdOptions::Num(_) => return None,
        };

        let embedding = point
            .vectors
            .and_then(|vectors| vectors.vectors_options)
            .and_then(|options| match options {
                VectorsOptions::Vector(vector) => Some(Embedding::new(vector.data)),
                _ => None,
            });

        Some(SearchResult {
            chunk: Chunk {
                id: ChunkId::from_uuid(id),
                text,
                index: chunk_index,
            },
            score: point.score,
            embedding,
        })
    }

    fn payload_for(chunk: &Chunk) -> Result<Payload, VectorStoreError> {
        Payload::try_from(serde_json::json!({
            "text": chunk.text,
            "chunk_index": chunk.index,
        }))
        .map_err(|e| VectorStoreError::UpsertFailed(e.to_string()))
    }
}

#[async_trait]
impl VectorStore for QdrantAdapter {
    #[instrument(skip(self))]
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        Ok(response
            .collections
            .into_iter()
            .map(|collection| collection.name)
            .collect())
    }

    #[instrument(skip(self))]
    async fn index_exists(&self, index: &str) -> Result<bool, VectorStoreError> {
        self.client
            .collection_exists(index)
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))
    }

    #[instrument(skip(self, config), fields(dimension = config.dimension))]
    async fn create_index(
        &self,
        index: &str,
        config: &IndexConfig,
    ) -> Result<bool, VectorStoreError> {
        if self.index_exists(index).await? {
            info!(collection = %index, "collection already exists");
            return Ok(false);
        }

        debug!(cloud = %config.cloud.cloud, region = %config.cloud.region, "placement is fixed by the Qdrant deployment");

        let vectors_config = VectorsConfig::from(VectorParamsBuilder::new(
            config.dimension,
            Self::map_distance_metric(&config.distance_metric),
        ));

        self.client
            .create_collection(CreateCollectionBuilder::new(index).vectors_config(vectors_config))
            .await
            .map_err(|e| VectorStoreError::IndexCreationFailed(e.to_string()))?;

        info!(collection = %index, "collection_created");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, index: &str) -> Result<(), VectorStoreError> {
        if !self.index_exists(index).await? {
            return Ok(());
        }

        self.client
            .delete_collection(index)
            .await
            .map_err(|e| VectorStoreError::IndexDeletionFailed(e.to_string()))?;

        info!(collection = %index, "collection_deleted");
        Ok(())
    }

    #[instrument(skip(self, chunks, embeddings), fields(count = chunks.len()))]
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

        let points = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                Ok(PointStruct::new(
                    PointId::from(chunk.id.to_string()),
                    embedding.values.clone(),
                    Self::payload_for(chunk)?,
                ))
            })
            .collect::<Result<Vec<_>, VectorStoreError>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(index, points).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertFailed(e.to_string()))?;

        info!(collection = %index, count = chunks.len(), "points_upserted");
        Ok(())
    }

    #[instrument(skip(self, embedding))]
    async fn search(
        &self,
        index: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(index, embedding.values.clone(), top_k as u64)
                    .with_payload(true)
                    .with_vectors(true),
            )
            .await
            .map_err(|e| VectorStoreError::SearchFailed(e.to_string()))?;

        let results = response
            .result
            .into_iter()
            .filter_map(Self::search_result_from_point)
            .collect();

        Ok(results)
    }
}
