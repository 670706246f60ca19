mod chunk;
mod conversation;
mod document;
mod embedding;

pub use chunk::{Chunk, ChunkId};
pub use conversation::{ChatHistory, ConversationTurn};
pub use document::{ContentType, Document};
pub use embedding::Embedding;
