mod vector_store;

pub use vector_store::{
    InMemoryVectorStore, PINECONE_CONTROL_PLANE_URL, PineconeAdapter, QdrantAdapter,
    VectorStoreFactory,
};
