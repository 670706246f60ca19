use std::sync::Arc;

use crate::application::ports::{EmbedderError, LlmClient, LlmClientError, VectorStoreError};
use crate::domain::{ChatHistory, ChunkId, ConversationTurn};

use super::Retriever;
use super::prompts::{CONTEXT_SEPARATOR, answer_prompt, condense_question_prompt};
use super::token_counter::count_turn_tokens;

/// Answers questions from indexed context, resolving follow-ups against history.
pub struct RetrievalService {
    retriever: Retriever,
    llm_client: Arc<dyn LlmClient>,
    research_field: String,
    max_history_tokens: Option<usize>,
}

impl RetrievalService {
    pub fn new(
        retriever: Retriever,
        llm_client: Arc<dyn LlmClient>,
        research_field: String,
        max_history_tokens: Option<usize>,
    ) -> Self {
        Self {
            retriever,
            llm_client,
            research_field,
            max_history_tokens,
        }
    }

    #[tracing::instrument(skip_all, fields(index = %self.retriever.index_name(), history = history.len()))]
    pub async fn get_response(
        &self,
        question: &str,
        history: &ChatHistory,
    ) -> Result<QueryResult, RetrievalError> {
        let turns = self.history_window(history);

        let standalone_question = if turns.is_empty() {
            None
        } else {
            let prompt = condense_question_prompt(turns, question);
            let condensed = self
                .llm_client
                .complete(&prompt)
                .await
                .map_err(RetrievalError::Completion)?;
            let condensed = condensed.trim().to_string();
            tracing::debug!(turns = turns.len(), "Condensed follow-up question");
            Some(condensed)
        };

        let search_question = standalone_question.as_deref().unwrap_or(question);
        let results = self.retriever.retrieve(search_question).await?;

        let context = results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let prompt = answer_prompt(&self.research_field, &context, search_question);
        let answer = self
            .llm_client
            .complete(&prompt)
            .await
            .map_err(RetrievalError::Completion)?;

        tracing::info!(sources = results.len(), "Answer generated");

        let source_documents = results
            .into_iter()
            .map(|r| SourceDocument {
                id: r.chunk.id,
                page_content: r.chunk.text,
                score: r.score,
            })
            .collect();

        Ok(QueryResult {
            question: question.to_string(),
            standalone_question,
            answer,
            source_documents,
        })
    }

    fn history_window<'a>(&self, history: &'a ChatHistory) -> &'a [ConversationTurn] {
        match self.max_history_tokens {
            Some(budget) => {
                let window = history.recent_within(budget, count_turn_tokens);
                if window.len() < history.len() {
                    tracing::debug!(
                        kept = window.len(),
                        dropped = history.len() - window.len(),
                        "History trimmed to token budget"
                    );
                }
                window
            }
            None => history.turns(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub question: String,
    /// The rephrased question used for retrieval when history was present.
    pub standalone_question: Option<String>,
    pub answer: String,
    pub source_documents: Vec<SourceDocument>,
}

#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub id: ChunkId,
    pub page_content: String,
    pub score: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("embedding: {0}")]
    Embedding(EmbedderError),
    #[error("search: {0}")]
    Search(#[from] VectorStoreError),
    #[error("completion: {0}")]
    Completion(LlmClientError),
}
