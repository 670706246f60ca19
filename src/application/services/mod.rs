mod corpus_loader;
mod ingestion_service;
mod mmr;
pub mod prompts;
mod retrieval_service;
mod retriever;
mod token_counter;

pub use corpus_loader::{CorpusError, CorpusLoader, document_section, document_separator};
pub use ingestion_service::{IngestionError, IngestionService, ResetScope};
pub use mmr::{DEFAULT_LAMBDA, maximal_marginal_relevance};
pub use retrieval_service::{QueryResult, RetrievalError, RetrievalService, SourceDocument};
pub use retriever::{Retriever, SearchType};
pub use token_counter::{count_tokens, count_turn_tokens};
