use std::path::PathBuf;
use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::application::ports::{TranscriptionEngine, TranscriptionError};
use crate::application::services::{RetrievalError, RetrievalService, SourceDocument};
use crate::domain::{ChatHistory, ConversationTurn};

const PROMPT: &str = "you> ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Ask(String),
    Voice(PathBuf),
    History,
    Quit,
    Empty,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" => Self::Empty,
            "/quit" | "/exit" => Self::Quit,
            "/history" => Self::History,
            _ => match line.strip_prefix("/voice") {
                Some(path) if path.starts_with(char::is_whitespace) => {
                    Self::Voice(PathBuf::from(path.trim()))
                }
                _ => Self::Ask(line.to_string()),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("terminal: {0}")]
    Terminal(#[from] ReadlineError),
    #[error("reading {path}: {source}")]
    AudioFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("voice input is not configured")]
    VoiceUnavailable,
    #[error("transcription: {0}")]
    Transcription(#[from] TranscriptionError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Terminal chat over the responder, keeping its own session history.
pub struct Console {
    retrieval_service: Arc<RetrievalService>,
    transcription_engine: Option<Arc<dyn TranscriptionEngine>>,
    history: ChatHistory,
}

impl Console {
    pub fn new(
        retrieval_service: Arc<RetrievalService>,
        transcription_engine: Option<Arc<dyn TranscriptionEngine>>,
    ) -> Self {
        Self {
            retrieval_service,
            transcription_engine,
            history: ChatHistory::new(),
        }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub async fn run(mut self) -> Result<(), ConsoleError> {
        let mut editor = DefaultEditor::new()?;
        println!("Ask a question. Commands: /voice <file>, /history, /quit");

        loop {
            let line = match tokio::task::block_in_place(|| editor.readline(PROMPT)) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let command = ConsoleCommand::parse(&line);
            if command == ConsoleCommand::Quit {
                break;
            }
            if command != ConsoleCommand::Empty {
                let _ = editor.add_history_entry(line.trim());
            }

            // Failures end the current question, not the session.
            match self.execute(command).await {
                Ok(output) => println!("{output}"),
                Err(e) => {
                    tracing::warn!(error = %e, "Question failed");
                    eprintln!("error: {e}");
                }
            }
        }
        Ok(())
    }

    /// Runs one command and returns the text to show.
    pub async fn execute(&mut self, command: ConsoleCommand) -> Result<String, ConsoleError> {
        match command {
            ConsoleCommand::Empty | ConsoleCommand::Quit => Ok(String::new()),
            ConsoleCommand::History => Ok(render_history(&self.history)),
            ConsoleCommand::Ask(question) => self.ask(question).await,
            ConsoleCommand::Voice(path) => {
                let engine = self
                    .transcription_engine
                    .as_ref()
                    .ok_or(ConsoleError::VoiceUnavailable)?;
                let audio = tokio::fs::read(&path)
                    .await
                    .map_err(|source| ConsoleError::AudioFile {
                        path: path.clone(),
                        source,
                    })?;
                let question = engine.transcribe(&audio).await?;
                if question.is_empty() {
                    return Ok("(no speech recognized)".to_string());
                }
                let answer = self.ask(question.clone()).await?;
                Ok(format!("(heard) {question}\n\n{answer}"))
            }
        }
    }

    async fn ask(&mut self, question: String) -> Result<String, ConsoleError> {
        let result = self
            .retrieval_service
            .get_response(&question, &self.history)
            .await?;

        let rendered = format!(
            "{}{}",
            strip_code_fences(&result.answer),
            render_references(&result.source_documents)
        );
        self.history
            .push(ConversationTurn::new(question, result.answer));
        Ok(rendered)
    }
}

/// Drops markdown fence markers the model tends to wrap answers in.
pub fn strip_code_fences(answer: &str) -> String {
    answer
        .replace("```markdown", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn render_references(sources: &[SourceDocument]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n\nReferences:");
    for (i, source) in sources.iter().enumerate() {
        out.push_str(&format!("\n[{}] {}", i + 1, source.page_content));
    }
    out
}

pub fn render_history(history: &ChatHistory) -> String {
    if history.is_empty() {
        return "(no history yet)".to_string();
    }
    history
        .turns()
        .iter()
        .map(|turn| {
            format!(
                "you> {}\nassistant> {}",
                turn.question,
                strip_code_fences(&turn.answer)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
