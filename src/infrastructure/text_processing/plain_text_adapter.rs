use async_trait::async_trait;

use crate::application::ports::{FileLoader, FileLoaderError};
use crate::domain::{ContentType, Document};

/// Text and markdown files are already in the normalized form; only line
/// endings and a byte-order mark are cleaned up.
pub struct PlainTextAdapter;

#[async_trait]
impl FileLoader for PlainTextAdapter {
    async fn extract_text(
        &self,
        data: &[u8],
        document: &Document,
    ) -> Result<String, FileLoaderError> {
        if !matches!(
            document.content_type,
            ContentType::Text | ContentType::Markdown
        ) {
            return Err(FileLoaderError::UnsupportedContentType(
                document.content_type.as_mime().to_string(),
            ));
        }

        let text = std::str::from_utf8(data)
            .map_err(|e| FileLoaderError::ExtractionFailed(format!("{}: {e}", document.filename)))?;

        Ok(text.trim_start_matches('\u{feff}').replace("\r\n", "\n"))
    }
}
