//! Corpus ingestion: crawl a documentation site, convert pages to text and
//! split them into token-bounded chunks.

pub mod crawler;
pub mod fetcher;
pub mod parser;

use std::time::Duration;

use tracing::info;

use crate::rag::chunker::TokenChunker;
use crate::types::{Chunk, Document, Result};
use crate::utils::toml_config::IngestConfig;

pub use crawler::Crawler;

/// Crawl limits.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    /// Pause between page fetches
    pub delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

impl From<&IngestConfig> for CrawlConfig {
    fn from(config: &IngestConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            delay: Duration::from_millis(config.delay_ms),
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

/// Output of one ingestion pass.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
}

pub struct CorpusIngestor {
    crawler: Crawler,
    chunker: TokenChunker,
}

impl CorpusIngestor {
    pub fn new(crawl: CrawlConfig, chunker: TokenChunker) -> Result<Self> {
        Ok(Self {
            crawler: Crawler::new(crawl)?,
            chunker,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        let chunker = TokenChunker::new(config.chunk_size, config.chunk_overlap)?;
        Self::new(CrawlConfig::from(config), chunker)
    }

    pub async fn ingest(&self, root_url: &str) -> Result<Corpus> {
        let documents = self.crawler.crawl(root_url).await?;
        let chunks = self.chunker.chunk_documents(&documents)?;

        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            chunk_size = self.chunker.chunk_size(),
            chunk_overlap = self.chunker.chunk_overlap(),
            "Ingested corpus"
        );

        Ok(Corpus { documents, chunks })
    }
}
