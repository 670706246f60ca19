mod error;
mod health;
pub mod models;
mod response;
mod root;

pub use error::{ApiError, ErrorResponse};
pub use health::health_handler;
pub use response::{AUDIO_FIELD, TextQuery, text_response_handler, voice_response_handler};
pub use root::root_handler;
