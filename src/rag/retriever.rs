//! Top-k retrieval over embedded chunks.

use crate::db::vectorstore::VectorStore;
use crate::rag::embeddings::EmbeddingClient;
use crate::types::{AppError, Chunk, Result, SearchResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Collection the retriever indexes into
pub const DEFAULT_COLLECTION: &str = "documents";

/// Embeds chunks into a vector store and serves nearest-neighbour lookups.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    collection: String,
    k: usize,
    batch_size: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStore>, k: usize) -> Self {
        Self {
            embedder,
            store,
            collection: DEFAULT_COLLECTION.to_string(),
            k,
            batch_size: 64,
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Embed `chunks` in batches and upsert them, returning how many were stored
    pub async fn index(&self, chunks: &[Chunk]) -> Result<usize> {
        let mut stored = 0;

        for (batch_no, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(AppError::Embedding(format!(
                    "Embedding API returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }

            if !self.store.collection_exists(&self.collection).await? {
                let dimensions = vectors.first().map(|v| v.len()).unwrap_or_default();
                self.store
                    .create_collection(&self.collection, dimensions)
                    .await?;
            }

            let embedded: Vec<Chunk> = batch
                .iter()
                .cloned()
                .zip(vectors)
                .map(|(mut chunk, vector)| {
                    chunk.embedding = Some(vector);
                    chunk
                })
                .collect();

            stored += self.store.upsert(&self.collection, &embedded).await?;
            debug!(batch = batch_no, size = batch.len(), "Indexed chunk batch");
        }

        info!(
            chunks = stored,
            model = self.embedder.model_name(),
            store = self.store.provider_name(),
            "Indexed corpus"
        );
        Ok(stored)
    }

    /// The k chunks most similar to `query`, most similar first
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        if !self.store.collection_exists(&self.collection).await? {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_one(query).await?;
        let results = self
            .store
            .search(&self.collection, &query_vector, self.k)
            .await?;

        debug!(query = %query, hits = results.len(), "Retrieved chunks");
        Ok(results)
    }

    /// Newline-joined text of the retrieved chunks
    pub fn format_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::vectorstore::InMemoryVectorStore;
    use async_trait::async_trait;

    /// Scores texts by keyword presence so similarity is predictable
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingClient for KeywordEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.matches("dataset").count() as f32,
                        t.matches("trace").count() as f32,
                        0.1,
                    ]
                })
                .collect())
        }

        fn model_name(&self) -> &str {
            "keyword"
        }
    }

    fn retriever(k: usize) -> Retriever {
        Retriever::new(
            Arc::new(KeywordEmbedder),
            Arc::new(InMemoryVectorStore::new()),
            k,
        )
        .with_batch_size(2)
    }

    fn chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("https://docs/a", 0, "A dataset is a collection of examples".into()),
            Chunk::new("https://docs/b", 0, "Trace every call with trace decorators".into()),
            Chunk::new("https://docs/c", 0, "dataset dataset dataset".into()),
            Chunk::new("https://docs/d", 0, "Nothing relevant here".into()),
            Chunk::new("https://docs/e", 0, "Another trace page".into()),
        ]
    }

    #[tokio::test]
    async fn test_retrieve_returns_k_ordered() {
        let retriever = retriever(2);
        assert_eq!(retriever.index(&chunks()).await.unwrap(), 5);

        let results = retriever.retrieve("What is a dataset?").await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| r.chunk.content.contains("dataset")));
    }

    #[tokio::test]
    async fn test_retrieve_fewer_than_k() {
        let retriever = retriever(4);
        retriever.index(&chunks()[..2]).await.unwrap();

        let results = retriever.retrieve("trace").await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_before_index_is_empty() {
        let retriever = retriever(4);
        assert!(retriever.retrieve("anything").await.unwrap().is_empty());
    }

    #[test]
    fn test_format_context_joins_with_newlines() {
        let results: Vec<SearchResult> = chunks()
            .into_iter()
            .take(2)
            .map(|chunk| SearchResult { chunk, score: 1.0 })
            .collect();

        assert_eq!(
            Retriever::format_context(&results),
            "A dataset is a collection of examples\nTrace every call with trace decorators"
        );
    }
}
