//! Vector stores.
//!
//! The retriever talks to the index through the [`VectorStore`] trait. The
//! bundled backend is [`InMemoryVectorStore`], an exact cosine-similarity
//! index held in process memory.

pub mod vectorstore;

pub use vectorstore::{CollectionStats, InMemoryVectorStore, VectorStore};
