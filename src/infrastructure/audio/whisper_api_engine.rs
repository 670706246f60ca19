use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

const UPLOAD_FILE_NAME: &str = "audio.wav";

/// Decoding options sent with every transcription request.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOptions {
    pub model: String,
    pub language: String,
    pub temperature: f32,
}

/// Whisper over an OpenAI-compatible `/audio/transcriptions` endpoint.
///
/// Audio is staged in a uniquely named temporary file that is removed when the
/// call returns, whether the request succeeded or not.
pub struct WhisperApiEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    options: TranscriptionOptions,
    staging_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl WhisperApiEngine {
    pub fn new(base_url: &str, api_key: String, options: TranscriptionOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            options,
            staging_dir: None,
        }
    }

    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    fn stage(&self, audio_data: &[u8]) -> Result<tempfile::NamedTempFile, TranscriptionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ragchat-audio-").suffix(".wav");

        let mut staged = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        staged.write_all(audio_data)?;
        staged.flush()?;
        Ok(staged)
    }
}

#[async_trait]
impl TranscriptionEngine for WhisperApiEngine {
    #[tracing::instrument(skip(self, audio_data), fields(model = %self.options.model, bytes = audio_data.len()))]
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, TranscriptionError> {
        if audio_data.is_empty() {
            tracing::debug!("Empty audio clip, nothing to transcribe");
            return Ok(String::new());
        }

        let staged = self.stage(audio_data)?;
        tracing::debug!(path = %staged.path().display(), "Audio staged");
        let file_bytes = tokio::fs::read(staged.path()).await?;

        let file_part = multipart::Part::bytes(file_bytes)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str("audio/wav")
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("mime: {}", e)))?;

        let form = multipart::Form::new()
            .text("model", self.options.model.clone())
            .text("language", self.options.language.clone())
            .text("temperature", self.options.temperature.to_string())
            .text("response_format", "json")
            .part("file", file_part);

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("request: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptionError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TranscriptionError::ApiRequestFailed(format!(
                "status {}: {}",
                status, body
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        drop(staged);

        tracing::info!(chars = result.text.len(), "Transcription completed");
        Ok(result.text.trim().to_string())
    }
}
