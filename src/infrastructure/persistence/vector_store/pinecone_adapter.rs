use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::application::ports::{IndexConfig, SearchResult, VectorStore, VectorStoreError};
use crate::domain::{Chunk, ChunkId, Embedding};

pub const PINECONE_CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const PINECONE_API_VERSION: &str = "2024-07";
const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(120);
const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
const TEXT_FIELD: &str = "text";
const CHUNK_INDEX_FIELD: &str = "chunk_index";

/// Pinecone serverless indexes over the REST control and data planes.
pub struct PineconeAdapter {
    client: Client,
    control_plane_url: String,
    api_key: String,
    namespace: String,
    upsert_batch_size: usize,
    ready_timeout: Duration,
    poll_interval: Duration,
    hosts: RwLock<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: Option<IndexStatus>,
}

#[derive(Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u64,
    metric: &'static str,
    spec: IndexSpec<'a>,
}

#[derive(Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<VectorRecord<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct VectorRecord<'a> {
    id: String,
    values: &'a [f32],
    metadata: HashMap<&'static str, serde_json::Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_values: bool,
    include_metadata: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    values: Vec<f32>,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl PineconeAdapter {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            control_plane_url: PINECONE_CONTROL_PLANE_URL.to_string(),
            api_key,
            namespace: String::new(),
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            poll_interval: READY_POLL_INTERVAL,
            hosts: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_control_plane_url(mut self, url: impl Into<String>) -> Self {
        self.control_plane_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_upsert_batch_size(mut self, batch_size: usize) -> Self {
        self.upsert_batch_size = batch_size.max(1);
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.ready_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", PINECONE_API_VERSION)
    }

    async fn describe(&self, index: &str) -> Result<Option<IndexModel>, VectorStoreError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/indexes/{}", self.control_plane_url, index)),
            )
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, VectorStoreError::ConnectionFailed).await?;

        response
            .json::<IndexModel>()
            .await
            .map(Some)
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))
    }

    /// Data-plane base URL of `index`, resolved once and cached.
    async fn data_plane_url(&self, index: &str) -> Result<String, VectorStoreError> {
        if let Some(host) = self.hosts.read().await.get(index) {
            return Ok(host.clone());
        }

        let model = self
            .describe(index)
            .await?
            .ok_or_else(|| VectorStoreError::IndexNotFound(index.to_string()))?;
        if model.host.is_empty() {
            return Err(VectorStoreError::IndexNotReady(index.to_string()));
        }

        let url = if model.host.starts_with("http://") || model.host.starts_with("https://") {
            model.host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", model.host.trim_end_matches('/'))
        };

        self.hosts
            .write()
            .await
            .insert(index.to_string(), url.clone());
        Ok(url)
    }

    async fn wait_until_ready(&self, index: &str) -> Result<(), VectorStoreError> {
        let deadline = tokio::time::Instant::now() + self.ready_timeout;

        loop {
            let ready = self
                .describe(index)
                .await?
                .and_then(|model| model.status)
                .map(|status| status.ready)
                .unwrap_or(false);
            if ready {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(VectorStoreError::IndexNotReady(index.to_string()));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Deletion is asynchronous: the index stays listed as terminating for a while.
    async fn wait_until_deleted(&self, index: &str) -> Result<(), VectorStoreError> {
        let deadline = tokio::time::Instant::now() + self.ready_timeout;

        while self.describe(index).await?.is_some() {
            if tokio::time::Instant::now() >= deadline {
                return Err(VectorStoreError::IndexDeletionFailed(format!(
                    "{} still terminating after {:?}",
                    index, self.ready_timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Ok(())
    }
}

async fn ensure_success(
    response: Response,
    error: fn(String) -> VectorStoreError,
) -> Result<Response, VectorStoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(error(format!("HTTP {}: {}", status, body)))
}

#[async_trait]
impl VectorStore for PineconeAdapter {
    #[instrument(skip(self))]
    async fn list_indexes(&self) -> Result<Vec<String>, VectorStoreError> {
        let response = self
            .authorized(
                self.client
                    .get(format!("{}/indexes", self.control_plane_url)),
            )
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;
        let response = ensure_success(response, VectorStoreError::ConnectionFailed).await?;

        let list: IndexList = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;
        Ok(list.indexes.into_iter().map(|index| index.name).collect())
    }

    #[instrument(skip(self))]
    async fn index_exists(&self, index: &str) -> Result<bool, VectorStoreError> {
        Ok(self.list_indexes().await?.iter().any(|name| name == index))
    }

    #[instrument(skip(self, config), fields(dimension = config.dimension, region = %config.cloud.region))]
    async fn create_index(
        &self,
        index: &str,
        config: &IndexConfig,
    ) -> Result<bool, VectorStoreError> {
        if self.index_exists(index).await? {
            info!(index = %index, "index already exists");
            return Ok(false);
        }

        let request_body = CreateIndexRequest {
            name: index,
            dimension: config.dimension,
            metric: config.distance_metric.as_str(),
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &config.cloud.cloud,
                    region: &config.cloud.region,
                },
            },
        };

        info!(index = %index, "creating index");
        let response = self
            .authorized(
                self.client
                    .post(format!("{}/indexes", self.control_plane_url))
                    .json(&request_body),
            )
            .send()
            .await
            .map_err(|e| VectorStoreError::IndexCreationFailed(e.to_string()))?;

        if response.status() == StatusCode::CONFLICT {
            info!(index = %index, "index created concurrently");
            return Ok(false);
        }
        ensure_success(response, VectorStoreError::IndexCreationFailed).await?;

        self.wait_until_ready(index).await?;
        info!(index = %index, "index_created");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, index: &str) -> Result<(), VectorStoreError> {
        let response = self
            .authorized(
                self.client
                    .delete(format!("{}/indexes/{}", self.control_plane_url, index)),
            )
            .send()
            .await
            .map_err(|e| VectorStoreError::IndexDeletionFailed(e.to_string()))?;

        self.hosts.write().await.remove(index);

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response, VectorStoreError::IndexDeletionFailed).await?;
        self.wait_until_deleted(index).await?;

        info!(index = %index, "index_deleted");
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

        let base_url = self.data_plane_url(index).await?;
        let pairs: Vec<(&Chunk, &Embedding)> = chunks.iter().zip(embeddings.iter()).collect();

        for batch in pairs.chunks(self.upsert_batch_size) {
            let vectors = batch
                .iter()
                .map(|(chunk, embedding)| VectorRecord {
                    id: chunk.id.to_string(),
                    values: &embedding.values,
                    metadata: HashMap::from([
                        (TEXT_FIELD, serde_json::Value::String(chunk.text.clone())),
                        (CHUNK_INDEX_FIELD, serde_json::Value::from(chunk.index as u64)),
                    ]),
                })
                .collect();

            let response = self
                .authorized(
                    self.client
                        .post(format!("{}/vectors/upsert", base_url))
                        .json(&UpsertRequest {
                            vectors,
                            namespace: &self.namespace,
                        }),
                )
                .send()
                .await
                .map_err(|e| VectorStoreError::UpsertFailed(e.to_string()))?;
            ensure_success(response, VectorStoreError::UpsertFailed).await?;
        }

        info!(index = %index, count = chunks.len(), "points_upserted");
        Ok(())
    }

    #[instrument(skip(self, embedding))]
    async fn search(
        &self,
        index: &str,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, VectorStoreError> {
        let base_url = self.data_plane_url(index).await?;

        let response = self
            .authorized(self.client.post(format!("{}/query", base_url)).json(
                &QueryRequest {
                    vector: &embedding.values,
                    top_k,
                    include_values: true,
                    include_metadata: true,
                    namespace: &self.namespace,
                },
            ))
            .send()
            .await
            .map_err(|e| VectorStoreError::SearchFailed(e.to_string()))?;
        let response = ensure_success(response, VectorStoreError::SearchFailed).await?;

        let query: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::InvalidResponse(e.to_string()))?;

        let results = query
            .matches
            .into_iter()
            .filter_map(|m| {
                let Some(text) = m.metadata.get(TEXT_FIELD).and_then(|v| v.as_str()) else {
                    warn!(id = %m.id, "match has no text metadata, skipped");
                    return None;
                };
                let text = text.to_string();
                let chunk_index = m
                    .metadata
                    .get(CHUNK_INDEX_FIELD)
                    .and_then(|v| v.as_f64())
                    .map(|v| v as usize)
                    .unwrap_or_default();
                let id = ChunkId::parse(&m.id).unwrap_or_else(|| {
                    warn!(id = %m.id, "match id is not a uuid, assigned a new one");
                    ChunkId::new()
                });
                let chunk = Chunk {
                    id,
                    text,
                    index: chunk_index,
                };
                let embedding = (!m.values.is_empty()).then(|| Embedding::new(m.values));

                Some(SearchResult {
                    chunk,
                    score: m.score,
                    embedding,
                })
            })
            .collect();

        Ok(results)
    }
}
