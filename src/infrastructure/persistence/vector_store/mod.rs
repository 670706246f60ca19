mod in_memory_vector_store;
mod pinecone_adapter;
mod qdrant_adapter;
mod vector_store_factory;

pub use in_memory_vector_store::InMemoryVectorStore;
pub use pinecone_adapter::{PINECONE_CONTROL_PLANE_URL, PineconeAdapter};
pub use qdrant_adapter::QdrantAdapter;
pub use vector_store_factory::VectorStoreFactory;
