mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VARIABLE, Environment};
pub use settings::{
    ChunkingSettings, CorpusSettings, EmbeddingsSettings, LlmSettings, LoggingSettings,
    ResetScopeSetting, RetrievalSettings, SearchTypeSetting, ServerSettings, Settings,
    TranscriptionProviderSetting, TranscriptionSettings, VectorStoreProvider,
    VectorStoreSettings,
};
