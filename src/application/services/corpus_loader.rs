use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::ports::{FileLoader, FileLoaderError, TextSplitter, TextSplitterError};
use crate::domain::{Chunk, ContentType, Document};

const SEPARATOR_RULE_WIDTH: usize = 60;

/// Reads every supported file of a directory into one text blob and splits it.
pub struct CorpusLoader {
    file_loader: Arc<dyn FileLoader>,
    text_splitter: Arc<dyn TextSplitter>,
}

impl CorpusLoader {
    pub fn new(file_loader: Arc<dyn FileLoader>, text_splitter: Arc<dyn TextSplitter>) -> Self {
        Self {
            file_loader,
            text_splitter,
        }
    }

    #[tracing::instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn load(&self, dir: &Path) -> Result<Vec<Chunk>, CorpusError> {
        let corpus = self.load_text(dir).await?;

        tracing::info!(chars = corpus.chars().count(), "Splitting corpus into chunks");
        let chunks = self.text_splitter.split(&corpus).await?;
        tracing::info!(chunks = chunks.len(), "Finished splitting corpus");

        Ok(chunks)
    }

    /// The concatenated, header-prefixed corpus before splitting.
    pub async fn load_text(&self, dir: &Path) -> Result<String, CorpusError> {
        let files = list_files(dir).await?;
        tracing::info!(files = files.len(), "Converting corpus documents");

        let mut sections = Vec::with_capacity(files.len());

        for path in files {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                tracing::warn!(path = %path.display(), "Skipping file with non UTF-8 name");
                continue;
            };

            let Some(content_type) = ContentType::from_path(&path) else {
                tracing::warn!(filename = %filename, "Skipping file with unsupported type");
                continue;
            };

            let data = match tokio::fs::read(&path).await {
                Ok(data) => data,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(filename = %filename, "File vanished before reading");
                    continue;
                }
                Err(e) => return Err(CorpusError::ReadFile { path, source: e }),
            };

            let document = Document::new(filename.clone(), content_type, data.len() as u64);
            let text = match self.file_loader.extract_text(&data, &document).await {
                Ok(text) => text,
                Err(FileLoaderError::NoTextFound(_)) => {
                    tracing::warn!(filename = %filename, "No text extracted, skipping");
                    continue;
                }
                Err(e) => return Err(CorpusError::FileLoading(e)),
            };

            let text = text.trim();
            if text.is_empty() {
                tracing::debug!(filename = %filename, "Empty document, skipping");
                continue;
            }

            tracing::debug!(filename = %filename, chars = text.len(), "Converted document");
            sections.push(document_section(&filename, text));
        }

        Ok(sections.join(&document_separator()))
    }
}

pub fn document_section(filename: &str, text: &str) -> String {
    format!("## {filename}\n\n{text}")
}

pub fn document_separator() -> String {
    format!("\n\n{}\n\n", "-".repeat(SEPARATOR_RULE_WIDTH))
}

/// Regular files directly inside `dir`, ordered by file name.
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, CorpusError> {
    let read_dir_error = |source| CorpusError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_dir_error)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
        let path = entry.path();
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(CorpusError::ReadFile { path, source: e }),
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("reading directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
    #[error("reading file {path}: {source}")]
    ReadFile { path: PathBuf, source: io::Error },
    #[error("file loading: {0}")]
    FileLoading(#[from] FileLoaderError),
    #[error("text splitting: {0}")]
    Splitting(#[from] TextSplitterError),
}
