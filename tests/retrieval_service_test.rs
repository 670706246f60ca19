mod common;

use std::sync::Arc;

use ragchat::application::ports::{CloudSpec, Embedder, IndexConfig, VectorStore, VectorStoreError};
use ragchat::application::services::{
    CorpusLoader, IngestionService, ResetScope, RetrievalError, RetrievalService, Retriever,
    SearchType,
};
use ragchat::domain::{ChatHistory, Chunk, ConversationTurn};
use ragchat::infrastructure::persistence::InMemoryVectorStore;
use ragchat::infrastructure::text_processing::{CompositeFileLoader, RecursiveCharacterSplitter};

use common::{DIMENSION, FailingEmbedder, KeywordEmbedder, ScriptedLlmClient, keyword_vector};

const INDEX: &str = "papers";
const MMR_CHUNK: &str = "MMR balances relevance against diversity.";
const LIMITATION_CHUNK: &str = "A known limitation of MMR is its quadratic cost.";
const ATTENTION_CHUNK: &str = "The transformer is built on attention.";

async fn seeded_store() -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .create_index(INDEX, &IndexConfig::new(DIMENSION, CloudSpec::default()))
        .await
        .unwrap();
    let chunks: Vec<Chunk> = [MMR_CHUNK, LIMITATION_CHUNK, ATTENTION_CHUNK]
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk::new(text.to_string(), i))
        .collect();
    let embeddings: Vec<_> = chunks.iter().map(|c| keyword_vector(&c.text)).collect();
    store.upsert(INDEX, &chunks, &embeddings).await.unwrap();
    store
}

fn service(
    store: Arc<dyn VectorStore>,
    llm: Arc<ScriptedLlmClient>,
    k: usize,
    max_history_tokens: Option<usize>,
) -> RetrievalService {
    let retriever = Retriever::new(
        Arc::new(KeywordEmbedder),
        store,
        INDEX.to_string(),
        k,
        SearchType::Similarity,
    );
    RetrievalService::new(retriever, llm, "AI".to_string(), max_history_tokens)
}

#[tokio::test]
async fn given_empty_history_when_asked_then_single_completion_with_context() {
    let llm = Arc::new(ScriptedLlmClient::new("It uses attention."));
    let service = service(seeded_store().await, llm.clone(), 1, None);

    let result = service
        .get_response("What is the transformer built on?", &ChatHistory::new())
        .await
        .unwrap();

    assert_eq!(result.answer, "It uses attention.");
    assert_eq!(result.standalone_question, None);
    assert_eq!(result.source_documents.len(), 1);
    assert_eq!(result.source_documents[0].page_content, ATTENTION_CHUNK);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("specializing in AI"));
    assert!(prompts[0].contains(ATTENTION_CHUNK));
    assert!(prompts[0].contains("Question: What is the transformer built on?"));
}

#[tokio::test]
async fn given_history_when_follow_up_asked_then_question_condensed_before_retrieval() {
    let llm = Arc::new(
        ScriptedLlmClient::new("Its cost grows quadratically.")
            .with_replies(&["What is the limitation of MMR?"]),
    );
    let service = service(seeded_store().await, llm.clone(), 1, None);
    let history: ChatHistory = [ConversationTurn::new(
        "What is MMR?",
        "MMR balances relevance and diversity.",
    )]
    .into_iter()
    .collect();

    let result = service
        .get_response("What about its limitations?", &history)
        .await
        .unwrap();

    assert_eq!(
        result.standalone_question.as_deref(),
        Some("What is the limitation of MMR?")
    );
    assert_eq!(result.question, "What about its limitations?");
    assert_eq!(result.source_documents[0].page_content, LIMITATION_CHUNK);

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Human: What is MMR?\nAssistant: MMR balances relevance and diversity."));
    assert!(prompts[0].contains("Follow Up Input: What about its limitations?"));
    assert!(prompts[1].contains("Question: What is the limitation of MMR?"));
}

#[tokio::test]
async fn given_history_budget_when_asked_then_only_recent_turns_condensed() {
    let llm = Arc::new(ScriptedLlmClient::new("answer").with_replies(&["standalone"]));
    let service = service(seeded_store().await, llm.clone(), 1, Some(40));
    let history: ChatHistory = [
        ConversationTurn::new("oldest question ".repeat(20), "oldest answer ".repeat(20)),
        ConversationTurn::new("What is MMR?", "A reranking method."),
    ]
    .into_iter()
    .collect();

    service.get_response("And its cost?", &history).await.unwrap();

    let condense_prompt = &llm.prompts()[0];
    assert!(condense_prompt.contains("Human: What is MMR?"));
    assert!(!condense_prompt.contains("oldest question"));
}

#[tokio::test]
async fn given_no_history_within_budget_when_asked_then_question_used_verbatim() {
    let llm = Arc::new(ScriptedLlmClient::new("answer"));
    let service = service(seeded_store().await, llm.clone(), 1, Some(0));
    let history: ChatHistory = [ConversationTurn::new("What is MMR?", "A reranking method.")]
        .into_iter()
        .collect();

    let result = service.get_response("And its cost?", &history).await.unwrap();

    assert_eq!(result.standalone_question, None);
    assert_eq!(llm.prompts().len(), 1);
}

#[tokio::test]
async fn given_empty_index_when_asked_then_answer_without_sources() {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .create_index(INDEX, &IndexConfig::new(DIMENSION, CloudSpec::default()))
        .await
        .unwrap();
    let llm = Arc::new(ScriptedLlmClient::new("More information is needed."));
    let service = service(store, llm.clone(), 5, None);

    let result = service
        .get_response("Anything?", &ChatHistory::new())
        .await
        .unwrap();

    assert!(result.source_documents.is_empty());
    assert_eq!(result.answer, "More information is needed.");
}

#[tokio::test]
async fn given_missing_index_when_asked_then_search_error_propagates() {
    let llm = Arc::new(ScriptedLlmClient::new("unused"));
    let service = service(Arc::new(InMemoryVectorStore::new()), llm.clone(), 5, None);

    let result = service.get_response("Anything?", &ChatHistory::new()).await;

    assert!(matches!(
        result,
        Err(RetrievalError::Search(VectorStoreError::IndexNotFound(_)))
    ));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn given_failing_embedder_when_asked_then_embedding_error_propagates() {
    let embedder: Arc<dyn Embedder> = Arc::new(FailingEmbedder);
    let retriever = Retriever::new(
        embedder,
        seeded_store().await,
        INDEX.to_string(),
        5,
        SearchType::Similarity,
    );
    let service = RetrievalService::new(
        retriever,
        Arc::new(ScriptedLlmClient::new("unused")),
        "AI".to_string(),
        None,
    );

    let result = service.get_response("Anything?", &ChatHistory::new()).await;

    assert!(matches!(result, Err(RetrievalError::Embedding(_))));
}

#[tokio::test]
async fn given_near_duplicate_chunks_when_mmr_retrieves_then_diverse_chunk_preferred() {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .create_index(INDEX, &IndexConfig::new(DIMENSION, CloudSpec::default()))
        .await
        .unwrap();
    let texts = [
        "attention attention transformer",
        "attention attention transformer, restated",
        "transformer in pinecone",
    ];
    let chunks: Vec<Chunk> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| Chunk::new(t.to_string(), i))
        .collect();
    let embeddings: Vec<_> = chunks.iter().map(|c| keyword_vector(&c.text)).collect();
    store.upsert(INDEX, &chunks, &embeddings).await.unwrap();

    let retriever = Retriever::new(
        Arc::new(KeywordEmbedder),
        store,
        INDEX.to_string(),
        2,
        SearchType::Mmr {
            fetch_k: 20,
            lambda_mult: 0.5,
        },
    );

    let results = retriever.retrieve("attention transformer").await.unwrap();

    let picked: Vec<&str> = results.iter().map(|r| r.chunk.text.as_str()).collect();
    assert_eq!(picked.len(), 2);
    assert!(picked.contains(&"transformer in pinecone"));
}

#[tokio::test]
async fn given_ingested_single_document_when_asked_then_answer_grounded_in_its_segment() {
    let dir = tempfile::tempdir().unwrap();
    let text = "The whisper relay in building nine was installed on 3 March 2021.";
    std::fs::write(dir.path().join("doc1.txt"), text).unwrap();
    let store = Arc::new(InMemoryVectorStore::new());

    let ingestion = IngestionService::new(
        Arc::new(CorpusLoader::new(
            Arc::new(CompositeFileLoader::with_default_adapters()),
            Arc::new(RecursiveCharacterSplitter::new(2000, 200)),
        )),
        Arc::new(KeywordEmbedder),
        store.clone(),
        CloudSpec::default(),
        ResetScope::Account,
        100,
    );
    ingestion.rebuild(dir.path(), INDEX, DIMENSION).await.unwrap();

    let llm = Arc::new(ScriptedLlmClient::new(
        "The whisper relay was installed on 3 March 2021.",
    ));
    let service = service(store, llm.clone(), 5, None);

    let result = service
        .get_response("When was the whisper relay installed?", &ChatHistory::new())
        .await
        .unwrap();

    assert!(result.answer.contains("3 March 2021"));
    assert_eq!(result.source_documents.len(), 1);
    assert_eq!(
        result.source_documents[0].page_content,
        format!("## doc1.txt\n\n{text}")
    );
    assert!(llm.prompts()[0].contains("3 March 2021"));
}
