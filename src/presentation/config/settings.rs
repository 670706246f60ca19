use std::path::PathBuf;

use config::Environment as EnvironmentSource;
use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::ports::CloudSpec;
use crate::application::services::{ResetScope, SearchType};
use crate::infrastructure::audio::{TranscriptionOptions, TranscriptionProvider};

use super::Environment;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub vector_store: VectorStoreSettings,
    pub embeddings: EmbeddingsSettings,
    pub chunking: ChunkingSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub transcription: TranscriptionSettings,
    pub corpus: CorpusSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Defaults, then `appsettings.<env>.toml`, then `APP__SECTION__KEY` variables,
    /// then the providers' conventional credential variables.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        let mut settings: Settings = Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                EnvironmentSource::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.apply_credential_variables(|name| std::env::var(name).ok());
        if environment == Environment::Prod {
            settings.logging.json = true;
        }
        Ok(settings)
    }

    pub fn apply_credential_variables(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.vector_store.pinecone_api_key = Some(key);
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.qdrant_url = url;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key.get_or_insert_with(|| key.clone());
            self.embeddings.api_key.get_or_insert_with(|| key.clone());
            if self.transcription.provider == TranscriptionProviderSetting::OpenAi {
                self.transcription.api_key.get_or_insert(key);
            }
        }
        if self.transcription.provider == TranscriptionProviderSetting::Groq {
            if let Some(key) = lookup("GROQ_API_KEY") {
                self.transcription.api_key.get_or_insert(key);
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_mb: 25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    #[default]
    Pinecone,
    Qdrant,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetScopeSetting {
    #[default]
    Account,
    Index,
}

impl From<ResetScopeSetting> for ResetScope {
    fn from(value: ResetScopeSetting) -> Self {
        match value {
            ResetScopeSetting::Account => ResetScope::Account,
            ResetScopeSetting::Index => ResetScope::Index,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    pub index_name: String,
    pub dimension: u64,
    pub cloud: String,
    pub region: String,
    pub reset_scope: ResetScopeSetting,
    pub pinecone_api_key: Option<String>,
    pub pinecone_control_plane_url: String,
    pub namespace: Option<String>,
    pub upsert_batch_size: usize,
    pub ready_timeout_secs: u64,
    pub ready_poll_interval_ms: u64,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
}

impl VectorStoreSettings {
    pub fn cloud_spec(&self) -> CloudSpec {
        CloudSpec {
            cloud: self.cloud.clone(),
            region: self.region.clone(),
        }
    }
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::default(),
            index_name: "rag-pinecone".to_string(),
            dimension: 1536,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            reset_scope: ResetScopeSetting::default(),
            pinecone_api_key: None,
            pinecone_control_plane_url: "https://api.pinecone.io".to_string(),
            namespace: None,
            upsert_batch_size: 100,
            ready_timeout_secs: 120,
            ready_poll_interval_ms: 1000,
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingsSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub batch_size: usize,
}

impl Default for EmbeddingsSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "text-embedding-ada-002".to_string(),
            batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            chat_model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchTypeSetting {
    Similarity,
    #[default]
    Mmr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub search_type: SearchTypeSetting,
    pub k: usize,
    pub fetch_k: usize,
    pub lambda_mult: f32,
    pub research_field: String,
    pub max_history_tokens: Option<usize>,
}

impl RetrievalSettings {
    pub fn search_type(&self) -> SearchType {
        match self.search_type {
            SearchTypeSetting::Similarity => SearchType::Similarity,
            SearchTypeSetting::Mmr => SearchType::Mmr {
                fetch_k: self.fetch_k,
                lambda_mult: self.lambda_mult,
            },
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            search_type: SearchTypeSetting::default(),
            k: 5,
            fetch_k: 20,
            lambda_mult: 0.5,
            research_field: "AI".to_string(),
            max_history_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    #[default]
    Groq,
    #[serde(rename = "openai")]
    OpenAi,
}

impl From<TranscriptionProviderSetting> for TranscriptionProvider {
    fn from(value: TranscriptionProviderSetting) -> Self {
        match value {
            TranscriptionProviderSetting::Groq => TranscriptionProvider::Groq,
            TranscriptionProviderSetting::OpenAi => TranscriptionProvider::OpenAi,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub language: String,
    pub temperature: f32,
    pub staging_dir: Option<PathBuf>,
}

impl TranscriptionSettings {
    pub fn options(&self) -> TranscriptionOptions {
        TranscriptionOptions {
            model: self.model.clone(),
            language: self.language.clone(),
            temperature: self.temperature,
        }
    }
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProviderSetting::default(),
            api_key: None,
            base_url: None,
            model: "whisper-large-v3-turbo".to_string(),
            language: "en".to_string(),
            temperature: 0.0,
            staging_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub directory: PathBuf,
    pub pdf_timeout_secs: u64,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            pdf_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_overrides_when_defaulted_then_matches_reference_deployment() {
        let settings = Settings::default();

        assert_eq!(settings.vector_store.index_name, "rag-pinecone");
        assert_eq!(settings.vector_store.dimension, 1536);
        assert_eq!(settings.chunking.chunk_size, 2000);
        assert_eq!(settings.chunking.chunk_overlap, 200);
        assert_eq!(settings.llm.chat_model, "gpt-4o");
        assert_eq!(settings.retrieval.k, 5);
        assert_eq!(settings.retrieval.research_field, "AI");
        assert_eq!(settings.transcription.model, "whisper-large-v3-turbo");
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn given_openai_key_when_applied_then_shared_by_llm_and_embeddings_only() {
        let mut settings = Settings::default();

        settings.apply_credential_variables(|name| match name {
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "GROQ_API_KEY" => Some("gsk-test".to_string()),
            _ => None,
        });

        assert_eq!(settings.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.embeddings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.transcription.api_key.as_deref(), Some("gsk-test"));
    }

    #[test]
    fn given_configured_key_when_variable_set_then_configured_value_kept() {
        let mut settings = Settings::default();
        settings.llm.api_key = Some("from-file".to_string());

        settings.apply_credential_variables(|name| {
            (name == "OPENAI_API_KEY").then(|| "from-env".to_string())
        });

        assert_eq!(settings.llm.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn given_similarity_setting_when_mapped_then_plain_search_type() {
        let retrieval = RetrievalSettings {
            search_type: SearchTypeSetting::Similarity,
            ..RetrievalSettings::default()
        };

        assert!(matches!(retrieval.search_type(), SearchType::Similarity));
    }
}
