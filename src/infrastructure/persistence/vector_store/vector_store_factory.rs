use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{VectorStore, VectorStoreError};
use crate::presentation::config::{VectorStoreProvider, VectorStoreSettings};

use super::{InMemoryVectorStore, PineconeAdapter, QdrantAdapter};

pub struct VectorStoreFactory;

impl VectorStoreFactory {
    pub fn create(settings: &VectorStoreSettings) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
        tracing::info!(provider = ?settings.provider, index = %settings.index_name, "Loading vector store");

        match settings.provider {
            VectorStoreProvider::Pinecone => {
                let api_key = settings
                    .pinecone_api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .ok_or(VectorStoreError::MissingApiKey("PINECONE_API_KEY"))?;

                let mut adapter = PineconeAdapter::new(api_key)
                    .with_control_plane_url(settings.pinecone_control_plane_url.clone())
                    .with_upsert_batch_size(settings.upsert_batch_size)
                    .with_ready_timeout(
                        Duration::from_secs(settings.ready_timeout_secs),
                        Duration::from_millis(settings.ready_poll_interval_ms),
                    );
                if let Some(namespace) = &settings.namespace {
                    adapter = adapter.with_namespace(namespace.clone());
                }
                Ok(Arc::new(adapter))
            }
            VectorStoreProvider::Qdrant => Ok(Arc::new(QdrantAdapter::new(
                &settings.qdrant_url,
                settings.qdrant_api_key.clone(),
            )?)),
            VectorStoreProvider::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        }
    }
}
