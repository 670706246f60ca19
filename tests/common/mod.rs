#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use ragchat::application::ports::{
    Embedder, EmbedderError, LlmClient, LlmClientError, TranscriptionEngine, TranscriptionError,
};
use ragchat::domain::Embedding;

/// One vector component per keyword plus a constant, so every text has a
/// non-zero magnitude and texts sharing keywords are similar.
pub const KEYWORDS: [&str; 6] = [
    "attention",
    "transformer",
    "limitation",
    "mmr",
    "pinecone",
    "whisper",
];

pub const DIMENSION: u64 = KEYWORDS.len() as u64 + 1;

pub fn keyword_vector(text: &str) -> Embedding {
    let lower = text.to_lowercase();
    let mut values: Vec<f32> = KEYWORDS
        .iter()
        .map(|keyword| lower.matches(keyword).count() as f32)
        .collect();
    values.push(0.1);
    Embedding::new(values)
}

pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        Ok(texts.iter().map(|text| keyword_vector(text)).collect())
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Embedding, EmbedderError> {
        Err(EmbedderError::ApiRequestFailed("embedding service down".to_string()))
    }

    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Embedding>, EmbedderError> {
        Err(EmbedderError::ApiRequestFailed("embedding service down".to_string()))
    }
}

/// Replies with queued answers first, then with `fallback`; keeps every prompt.
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<String>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new(fallback: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: fallback.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(self, replies: &[&str]) -> Self {
        self.replies
            .lock()
            .unwrap()
            .extend(replies.iter().map(|r| r.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or_else(|| self.fallback.clone()))
    }
}

pub struct FailingLlmClient;

#[async_trait]
impl LlmClient for FailingLlmClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmClientError> {
        Err(LlmClientError::ApiRequestFailed("quota exceeded".to_string()))
    }
}

pub struct StubTranscriptionEngine {
    pub text: String,
}

#[async_trait]
impl TranscriptionEngine for StubTranscriptionEngine {
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, TranscriptionError> {
        if audio_data.is_empty() {
            return Ok(String::new());
        }
        Ok(self.text.clone())
    }
}

/// Serves `app` on an ephemeral local port until the sender is dropped or fired.
pub async fn start_mock_server(app: Router) -> (String, oneshot::Sender<()>) {
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .ok();
    });

    (base_url, shutdown_tx)
}
