mod openai_client;
mod openai_embedder;

pub use openai_client::{OPENAI_BASE_URL, OpenAiClient};
pub use openai_embedder::OpenAiEmbedder;
