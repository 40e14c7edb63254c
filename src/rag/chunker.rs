//! Token-bounded text chunking.
//!
//! Chunk sizes are measured in `cl100k_base` tokens, the encoding used by the
//! OpenAI chat and embedding models, so a chunk budget maps directly onto
//! model context.

use crate::types::{AppError, Chunk, Document, Result};
use std::sync::Arc;
use text_splitter::{ChunkConfig, ChunkSizer, TextSplitter};
use tiktoken_rs::CoreBPE;

/// Splits documents into overlapping chunks of at most `chunk_size` tokens.
pub struct TokenChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    bpe: Arc<CoreBPE>,
}

impl TokenChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| AppError::Internal(format!("Failed to load cl100k_base: {}", e)))?;
        Self::with_tokenizer(chunk_size, chunk_overlap, Arc::new(bpe))
    }

    pub fn with_tokenizer(
        chunk_size: usize,
        chunk_overlap: usize,
        bpe: Arc<CoreBPE>,
    ) -> Result<Self> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AppError::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than a non-zero chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            bpe,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Number of cl100k tokens in `text`
    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.size(text)
    }

    fn splitter(&self) -> Result<TextSplitter<&CoreBPE>> {
        let config = ChunkConfig::new(self.chunk_size)
            .with_sizer(&*self.bpe)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| AppError::InvalidInput(format!("Invalid chunk config: {}", e)))?
            .with_trim(true);
        Ok(TextSplitter::new(config))
    }

    /// Byte offset and text of every chunk, in document order
    pub fn split_indices<'t>(&self, text: &'t str) -> Result<Vec<(usize, &'t str)>> {
        let splitter = self.splitter()?;
        Ok(splitter.chunk_indices(text).collect())
    }

    pub fn split(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .split_indices(text)?
            .into_iter()
            .map(|(_, chunk)| chunk.to_string())
            .collect())
    }

    /// Split one document, tagging every chunk with its source and position
    pub fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        Ok(self
            .split(&document.content)?
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk::new(&document.source, index, content))
            .collect())
    }

    pub fn chunk_documents(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for document in documents {
            chunks.extend(self.chunk_document(document)?);
        }
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text() -> String {
        (0..200)
            .map(|i| format!("Sentence number {} describes tracing in LangSmith.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TokenChunker::new(2000, 200).unwrap();
        let chunks = chunker.split("What is LangChain? A framework.").unwrap();
        assert_eq!(chunks, vec!["What is LangChain? A framework.".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        let chunker = TokenChunker::new(2000, 200).unwrap();
        assert!(chunker.split("").unwrap().is_empty());
        assert!(chunker.split("   \n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_chunks_respect_token_budget() {
        let chunker = TokenChunker::new(50, 10).unwrap();
        let text = long_text();
        let chunks = chunker.split(&text).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunker.count_tokens(chunk) <= 50,
                "chunk over budget: {}",
                chunk
            );
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunker = TokenChunker::new(50, 10).unwrap();
        let text = long_text();
        let spans = chunker.split_indices(&text).unwrap();

        assert!(spans.len() > 1);
        for pair in spans.windows(2) {
            let (start, chunk) = pair[0];
            let (next_start, _) = pair[1];
            assert!(next_start < start + chunk.len(), "no overlap after offset {}", start);
        }
    }

    #[test]
    fn test_chunk_document_tags_source_and_index() {
        let chunker = TokenChunker::new(50, 10).unwrap();
        let document = Document {
            source: "https://docs.smith.langchain.com/tracing".to_string(),
            title: Some("Tracing".to_string()),
            content: long_text(),
        };

        let chunks = chunker.chunk_document(&document).unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.source, document.source);
            assert!(chunk.embedding.is_none());
        }
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        assert!(matches!(
            TokenChunker::new(100, 100),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            TokenChunker::new(0, 0),
            Err(AppError::InvalidInput(_))
        ));
    }
}
