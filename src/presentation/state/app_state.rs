use std::sync::Arc;

use tokio::sync::RwLock;

use crate::application::ports::TranscriptionEngine;
use crate::application::services::RetrievalService;
use crate::domain::{ChatHistory, ConversationTurn};

#[derive(Clone)]
pub struct AppState {
    pub retrieval_service: Arc<RetrievalService>,
    pub transcription_engine: Arc<dyn TranscriptionEngine>,
    /// Process-wide history shared by every caller.
    pub chat_history: Arc<RwLock<ChatHistory>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        retrieval_service: Arc<RetrievalService>,
        transcription_engine: Arc<dyn TranscriptionEngine>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            retrieval_service,
            transcription_engine,
            chat_history: Arc::new(RwLock::new(ChatHistory::new())),
            max_upload_bytes,
        }
    }

    pub async fn history_snapshot(&self) -> ChatHistory {
        self.chat_history.read().await.clone()
    }

    /// Appends a turn and returns the history as it stands afterwards.
    pub async fn record_turn(&self, turn: ConversationTurn) -> ChatHistory {
        let mut history = self.chat_history.write().await;
        history.push(turn);
        history.clone()
    }
}
