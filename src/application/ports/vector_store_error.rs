#[derive(Debug, thiserror::Error)]
pub enum VectorStoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("index not found: {0}")]
    IndexNotFound(String),
    #[error("index creation failed: {0}")]
    IndexCreationFailed(String),
    #[error("index deletion failed: {0}")]
    IndexDeletionFailed(String),
    #[error("index not ready: {0}")]
    IndexNotReady(String),
    #[error("upsert failed: {0}")]
    UpsertFailed(String),
    #[error("search failed: {0}")]
    SearchFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("missing API key for {0}")]
    MissingApiKey(&'static str),
}
