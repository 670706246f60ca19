use serde::Serialize;

use crate::application::services::{QueryResult, SourceDocument};
use crate::domain::ChatHistory;

/// `[question, answer]` pairs, oldest first.
pub type ChatHistoryDto = Vec<(String, String)>;

pub fn history_pairs(history: &ChatHistory) -> ChatHistoryDto {
    history
        .turns()
        .iter()
        .map(|turn| (turn.question.clone(), turn.answer.clone()))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct QueryResultDto {
    pub question: String,
    /// History the question was answered against.
    pub chat_history: ChatHistoryDto,
    pub answer: String,
    pub source_documents: Vec<SourceDocumentDto>,
}

impl QueryResultDto {
    pub fn new(result: QueryResult, history: &ChatHistory) -> Self {
        Self {
            question: result.question,
            chat_history: history_pairs(history),
            answer: result.answer,
            source_documents: result
                .source_documents
                .into_iter()
                .map(SourceDocumentDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SourceDocumentDto {
    pub page_content: String,
    pub metadata: SourceMetadataDto,
}

#[derive(Debug, Serialize)]
pub struct SourceMetadataDto {
    pub id: String,
    pub score: f32,
}

impl From<SourceDocument> for SourceDocumentDto {
    fn from(source: SourceDocument) -> Self {
        Self {
            page_content: source.page_content,
            metadata: SourceMetadataDto {
                id: source.id.to_string(),
                score: source.score,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub result: QueryResultDto,
    pub chat_history: ChatHistoryDto,
}

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub transcribed_text: String,
    pub result: QueryResultDto,
    pub chat_history: ChatHistoryDto,
}
