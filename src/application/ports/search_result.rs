use crate::domain::{Chunk, Embedding};

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
    /// Stored vector, when the backend returned it.
    pub embedding: Option<Embedding>,
}
