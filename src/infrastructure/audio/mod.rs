mod transcription_engine_factory;
mod whisper_api_engine;

pub use transcription_engine_factory::{
    GROQ_BASE_URL, TranscriptionEngineFactory, TranscriptionProvider,
};
pub use whisper_api_engine::{TranscriptionOptions, WhisperApiEngine};
