//! Vector Store Abstraction Layer
//!
//! The retriever talks to its index through [`VectorStore`], so the bundled
//! exact-search backend can be swapped for a real vector database without
//! touching the pipeline.
//!
//! ```rust,ignore
//! use ragcheck::db::{InMemoryVectorStore, VectorStore};
//!
//! let store = InMemoryVectorStore::new();
//! store.create_collection("docs", 1536).await?;
//! store.upsert("docs", &chunks).await?;
//! let results = store.search("docs", &query_embedding, 4).await?;
//! ```

use crate::types::{AppError, Chunk, Result, SearchResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Summary of one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub chunk_count: usize,
    pub dimensions: usize,
    pub distance_metric: String,
}

// ============================================================================
// Vector Store Trait
// ============================================================================

/// Abstract trait for vector index operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Get the name of this vector store provider.
    fn provider_name(&self) -> &'static str;

    /// Create a new collection with the specified vector dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a collection and all its chunks.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Check if a collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Get statistics about a collection.
    async fn collection_stats(&self, name: &str) -> Result<CollectionStats>;

    /// Upsert chunks with their embeddings into a collection.
    ///
    /// Chunks are identified by their `id` field; an existing chunk with the
    /// same id is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if any chunk is missing an embedding or its
    /// embedding does not match the collection's dimensions.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<usize>;

    /// Return at most `limit` chunks, sorted by similarity score (descending).
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Count chunks in a collection.
    async fn count(&self, collection: &str) -> Result<usize> {
        let stats = self.collection_stats(collection).await?;
        Ok(stats.chunk_count)
    }
}

// ============================================================================
// In-Memory Vector Store
// ============================================================================

/// Exact cosine-similarity index held in process memory.
///
/// Data is not persisted and will be lost when the process exits.
pub struct InMemoryVectorStore {
    collections: Arc<RwLock<HashMap<String, InMemoryCollection>>>,
}

struct InMemoryCollection {
    dimensions: usize,
    chunks: HashMap<String, Chunk>,
}

impl InMemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Calculate cosine similarity between two vectors.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(AppError::InvalidInput(format!(
                "Collection '{}' already exists",
                name
            )));
        }
        collections.insert(
            name.to_string(),
            InMemoryCollection {
                dimensions,
                chunks: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write();
        collections
            .remove(name)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))?;
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self.collections.read();
        Ok(collections.contains_key(name))
    }

    async fn collection_stats(&self, name: &str) -> Result<CollectionStats> {
        let collections = self.collections.read();
        let col = collections
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", name)))?;

        Ok(CollectionStats {
            name: name.to_string(),
            chunk_count: col.chunks.len(),
            dimensions: col.dimensions,
            distance_metric: "cosine".to_string(),
        })
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<usize> {
        let mut collections = self.collections.write();
        let col = collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        for chunk in chunks {
            match &chunk.embedding {
                None => {
                    return Err(AppError::InvalidInput(format!(
                        "Chunk '{}' is missing embedding",
                        chunk.id
                    )));
                }
                Some(embedding) if embedding.len() != col.dimensions => {
                    return Err(AppError::InvalidInput(format!(
                        "Chunk '{}' has {} dimensions, collection '{}' expects {}",
                        chunk.id,
                        embedding.len(),
                        collection,
                        col.dimensions
                    )));
                }
                Some(_) => {}
            }
        }

        for chunk in chunks {
            col.chunks.insert(chunk.id.clone(), chunk.clone());
        }

        Ok(chunks.len())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read();
        let col = collections
            .get(collection)
            .ok_or_else(|| AppError::NotFound(format!("Collection '{}' not found", collection)))?;

        let mut results: Vec<SearchResult> = col
            .chunks
            .values()
            .filter_map(|chunk| {
                let chunk_embedding = chunk.embedding.as_ref()?;
                let score = Self::cosine_similarity(embedding, chunk_embedding);
                Some(SearchResult {
                    chunk: Chunk {
                        embedding: None, // Don't return embeddings in results
                        ..chunk.clone()
                    },
                    score,
                })
            })
            .collect();

        // Sort by score descending; ties fall back to document order
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.source.cmp(&b.chunk.source))
                .then_with(|| a.chunk.index.cmp(&b.chunk.index))
        });

        results.truncate(limit);

        Ok(results)
    }
}

// ============================================================================
// Tests
// ============================================================================
