//! Retrieval Augmented Generation (RAG) components
//!
//! - [`chunker`] - token-bounded text splitting
//! - [`embeddings`] - embedding API clients
//! - [`retriever`] - indexing and top-k lookup over a [`VectorStore`](crate::db::VectorStore)
//!
//! # Example
//!
//! ```ignore
//! use ragcheck::rag::{chunker::TokenChunker, retriever::Retriever};
//!
//! let chunks = TokenChunker::new(2000, 200)?.chunk_documents(&documents)?;
//! let retriever = Retriever::new(embedder, store, 4);
//! retriever.index(&chunks).await?;
//!
//! let results = retriever.retrieve("How do I log a trace?").await?;
//! ```

pub mod chunker;
pub mod embeddings;
pub mod retriever;

pub use chunker::TokenChunker;
pub use embeddings::{create_embedding_client, EmbeddingClient};
pub use retriever::Retriever;
