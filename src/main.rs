use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use ragchat::application::ports::{Embedder, FileLoader, TranscriptionEngine, VectorStore};
use ragchat::application::services::{CorpusLoader, IngestionService, RetrievalService, Retriever};
use ragchat::domain::ContentType;
use ragchat::infrastructure::audio::TranscriptionEngineFactory;
use ragchat::infrastructure::llm::{OpenAiClient, OpenAiEmbedder};
use ragchat::infrastructure::observability::{TracingConfig, init_tracing};
use ragchat::infrastructure::persistence::VectorStoreFactory;
use ragchat::infrastructure::text_processing::{
    CompositeFileLoader, PdfAdapter, PlainTextAdapter, RecursiveCharacterSplitter,
};
use ragchat::presentation::{AppState, Console, Environment, Settings, create_router};

#[derive(Parser)]
#[command(name = "ragchat", version, about = "Question answering over a document corpus")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Reset the vector store and create an empty index.
    CreateIndex {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        dimension: Option<u64>,
    },
    /// Rebuild the index from a corpus directory.
    Ingest {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Chat in the terminal.
    Chat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("loading configuration")?;

    init_tracing(&TracingConfig {
        environment: environment.to_string(),
        level: settings.logging.level.clone(),
        json_format: settings.logging.json,
    });

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&settings).await,
        Command::CreateIndex { name, dimension } => {
            let name = name.unwrap_or_else(|| settings.vector_store.index_name.clone());
            let dimension = dimension.unwrap_or(settings.vector_store.dimension);
            ingestion_service(&settings)?
                .create_index(&name, dimension)
                .await?;
            println!("index `{name}` ready");
            Ok(())
        }
        Command::Ingest { dir, name } => {
            let dir = dir.unwrap_or_else(|| settings.corpus.directory.clone());
            let name = name.unwrap_or_else(|| settings.vector_store.index_name.clone());
            let stored = ingestion_service(&settings)?
                .rebuild(&dir, &name, settings.vector_store.dimension)
                .await?;
            println!("stored {stored} segments in `{name}`");
            Ok(())
        }
        Command::Chat => {
            let transcription_engine = match transcription_engine(&settings) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!(error = %e, "Voice input disabled");
                    None
                }
            };
            Console::new(retrieval_service(&settings)?, transcription_engine)
                .run()
                .await?;
            Ok(())
        }
    }
}

async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(
        retrieval_service(settings)?,
        transcription_engine(settings)?,
        settings.server.max_upload_mb * 1024 * 1024,
    );
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("invalid server address")?;
    tracing::info!(%addr, index = %settings.vector_store.index_name, "Listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn openai_key(value: &Option<String>) -> anyhow::Result<String> {
    value
        .clone()
        .filter(|k| !k.is_empty())
        .context("OPENAI_API_KEY is not set")
}

fn embedder(settings: &Settings) -> anyhow::Result<Arc<dyn Embedder>> {
    let mut embedder = OpenAiEmbedder::new(
        openai_key(&settings.embeddings.api_key)?,
        settings.embeddings.model.clone(),
    );
    if let Some(base_url) = &settings.embeddings.base_url {
        embedder = embedder.with_base_url(base_url.clone());
    }
    Ok(Arc::new(embedder))
}

fn vector_store(settings: &Settings) -> anyhow::Result<Arc<dyn VectorStore>> {
    Ok(VectorStoreFactory::create(&settings.vector_store)?)
}

fn transcription_engine(settings: &Settings) -> anyhow::Result<Arc<dyn TranscriptionEngine>> {
    let transcription = &settings.transcription;
    Ok(TranscriptionEngineFactory::create(
        transcription.provider.into(),
        transcription.options(),
        transcription.api_key.clone(),
        transcription.base_url.clone(),
        transcription.staging_dir.clone(),
    )?)
}

fn ingestion_service(settings: &Settings) -> anyhow::Result<IngestionService> {
    let plain_text: Arc<dyn FileLoader> = Arc::new(PlainTextAdapter);
    let pdf: Arc<dyn FileLoader> = Arc::new(PdfAdapter::with_timeout(Duration::from_secs(
        settings.corpus.pdf_timeout_secs,
    )));
    let file_loader = Arc::new(CompositeFileLoader::new(vec![
        (ContentType::Text, Arc::clone(&plain_text)),
        (ContentType::Markdown, plain_text),
        (ContentType::Pdf, pdf),
    ]));
    let text_splitter = Arc::new(RecursiveCharacterSplitter::new(
        settings.chunking.chunk_size,
        settings.chunking.chunk_overlap,
    ));

    Ok(IngestionService::new(
        Arc::new(CorpusLoader::new(file_loader, text_splitter)),
        embedder(settings)?,
        vector_store(settings)?,
        settings.vector_store.cloud_spec(),
        settings.vector_store.reset_scope.into(),
        settings.embeddings.batch_size,
    ))
}

fn retrieval_service(settings: &Settings) -> anyhow::Result<Arc<RetrievalService>> {
    let retriever = Retriever::new(
        embedder(settings)?,
        vector_store(settings)?,
        settings.vector_store.index_name.clone(),
        settings.retrieval.k,
        settings.retrieval.search_type(),
    );

    let mut llm_client = OpenAiClient::new(
        openai_key(&settings.llm.api_key)?,
        settings.llm.chat_model.clone(),
        settings.llm.temperature,
    )
    .with_max_tokens(settings.llm.max_tokens);
    if let Some(base_url) = &settings.llm.base_url {
        llm_client = llm_client.with_base_url(base_url.clone());
    }

    Ok(Arc::new(RetrievalService::new(
        retriever,
        Arc::new(llm_client),
        settings.retrieval.research_field.clone(),
        settings.retrieval.max_history_tokens,
    )))
}
