use axum::Json;
use axum::extract::{Multipart, Query, State};
use serde::Deserialize;

use crate::domain::ConversationTurn;
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::error::ApiError;
use super::models::{QueryResultDto, TextResponse, VoiceResponse, history_pairs};

pub const AUDIO_FIELD: &str = "audio";

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    pub user_query: String,
}

#[tracing::instrument(skip_all)]
pub async fn text_response_handler(
    State(state): State<AppState>,
    Query(query): Query<TextQuery>,
) -> Result<Json<TextResponse>, ApiError> {
    tracing::debug!(question = %sanitize_prompt(&query.user_query), "Processing text question");

    let (result, chat_history) = answer(&state, query.user_query).await?;

    Ok(Json(TextResponse {
        result,
        chat_history,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn voice_response_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VoiceResponse>, ApiError> {
    let mut audio = None;
    while let Some(field) = multipart.next_field().await.map_err(ApiError::internal)? {
        if field.name() == Some(AUDIO_FIELD) {
            audio = Some(field.bytes().await.map_err(ApiError::internal)?);
            break;
        }
    }
    let audio = audio.ok_or_else(|| {
        ApiError::bad_request(format!("missing multipart field `{AUDIO_FIELD}`"))
    })?;

    tracing::debug!(bytes = audio.len(), "Transcribing uploaded audio");
    let transcribed_text = state
        .transcription_engine
        .transcribe(&audio)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Transcription failed");
            ApiError::internal(e)
        })?;

    let (result, chat_history) = answer(&state, transcribed_text.clone()).await?;

    Ok(Json(VoiceResponse {
        transcribed_text,
        result,
        chat_history,
    }))
}

async fn answer(
    state: &AppState,
    question: String,
) -> Result<(QueryResultDto, Vec<(String, String)>), ApiError> {
    let history = state.history_snapshot().await;

    let result = state
        .retrieval_service
        .get_response(&question, &history)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Answering failed");
            ApiError::internal(e)
        })?;

    tracing::info!(sources = result.source_documents.len(), "Question answered");

    let updated = state
        .record_turn(ConversationTurn::new(question, result.answer.clone()))
        .await;

    Ok((QueryResultDto::new(result, &updated), history_pairs(&updated)))
}
