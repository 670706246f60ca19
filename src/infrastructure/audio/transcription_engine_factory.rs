use std::path::PathBuf;
use std::sync::Arc;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};

use super::whisper_api_engine::{TranscriptionOptions, WhisperApiEngine};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionProvider {
    Groq,
    OpenAi,
}

impl TranscriptionProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            TranscriptionProvider::Groq => GROQ_BASE_URL,
            TranscriptionProvider::OpenAi => OPENAI_BASE_URL,
        }
    }

    pub fn api_key_variable(&self) -> &'static str {
        match self {
            TranscriptionProvider::Groq => "GROQ_API_KEY",
            TranscriptionProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

pub struct TranscriptionEngineFactory;

impl TranscriptionEngineFactory {
    pub fn create(
        provider: TranscriptionProvider,
        options: TranscriptionOptions,
        api_key: Option<String>,
        base_url: Option<String>,
        staging_dir: Option<PathBuf>,
    ) -> Result<Arc<dyn TranscriptionEngine>, TranscriptionError> {
        let key = api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TranscriptionError::MissingApiKey(provider.api_key_variable().to_string())
            })?;
        let base_url = base_url.unwrap_or_else(|| provider.default_base_url().to_string());

        tracing::info!(provider = ?provider, model = %options.model, "Loading transcription engine");
        let engine = WhisperApiEngine::new(&base_url, key, options).with_staging_dir(staging_dir);
        Ok(Arc::new(engine))
    }
}
