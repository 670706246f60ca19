use std::time::Duration;

use ragchat::application::ports::{FileLoader, FileLoaderError};
use ragchat::domain::{ContentType, Document};
use ragchat::infrastructure::text_processing::PdfAdapter;

#[tokio::test]
async fn given_markdown_document_when_extracted_by_pdf_adapter_then_unsupported() {
    let adapter = PdfAdapter::new();
    let document = Document::new("notes.md".to_string(), ContentType::Markdown, 5);

    let result = adapter.extract_text(b"# hi", &document).await;

    assert!(matches!(
        result,
        Err(FileLoaderError::UnsupportedContentType(mime)) if mime == "text/markdown"
    ));
}

#[tokio::test]
async fn given_garbage_bytes_when_extracted_then_fails_without_text() {
    let adapter = PdfAdapter::with_timeout(Duration::from_secs(10));
    let data = b"this is not a pdf at all";
    let document = Document::new("broken.pdf".to_string(), ContentType::Pdf, data.len() as u64);

    let result = adapter.extract_text(data, &document).await;

    assert!(matches!(
        result,
        Err(FileLoaderError::ExtractionFailed(_)) | Err(FileLoaderError::NoTextFound(_))
    ));
}

#[tokio::test]
async fn given_empty_pdf_bytes_when_extracted_then_fails() {
    let adapter = PdfAdapter::default();
    let document = Document::new("empty.pdf".to_string(), ContentType::Pdf, 0);

    let result = adapter.extract_text(&[], &document).await;

    assert!(result.is_err());
}
