mod distance_metric;
mod embedder;
mod file_loader;
mod index_config;
mod llm_client;
mod search_result;
mod text_splitter;
mod transcription_engine;
mod vector_store;
mod vector_store_error;

pub use distance_metric::DistanceMetric;
pub use embedder::{Embedder, EmbedderError};
pub use file_loader::{FileLoader, FileLoaderError};
pub use index_config::{CloudSpec, IndexConfig};
pub use llm_client::{LlmClient, LlmClientError};
pub use search_result::SearchResult;
pub use text_splitter::{TextSplitter, TextSplitterError};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
pub use vector_store::VectorStore;
pub use vector_store_error::VectorStoreError;
