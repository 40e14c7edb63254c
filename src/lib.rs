//! # ragcheck - Retrieval QA correctness evaluation
//!
//! Measures whether a retrieval-augmented question-answering pipeline gives
//! correct answers. A small labeled dataset is registered with an
//! experiment-tracking service, a documentation site is crawled and indexed,
//! and every question is answered by the pipeline and graded by an
//! LLM-as-judge against its reference answer.
//!
//! ## Overview
//!
//! The workflow runs in five stages:
//!
//! 1. [`dataset`] - register question / reference-answer pairs as a dataset
//! 2. [`ingest`] - crawl, convert HTML to text, split into token chunks
//! 3. [`rag`] - embed chunks and serve top-k retrieval
//! 4. [`chain`] - render the prompt and stream the chat model's answer
//! 5. [`eval`] - grade each answer and aggregate a report
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragcheck::{
//!     chain::PromptVariant, dataset::{default_examples, DatasetBuilder},
//!     db::InMemoryVectorStore, eval::{EvaluationRunner, QaEvaluator},
//!     ingest::CorpusIngestor, rag::{create_embedding_client, Retriever},
//!     tracking::create_tracker, LLMClientFactory, RagcheckConfig,
//! };
//!
//! let config = RagcheckConfig::load("ragcheck.toml")?;
//! let tracker = create_tracker(&config)?;
//! let dataset = DatasetBuilder::new(tracker.clone()).build(&default_examples()).await?;
//!
//! let corpus = CorpusIngestor::from_config(&config.ingest)?
//!     .ingest(&config.ingest.root_url)
//!     .await?;
//! let retriever = Arc::new(Retriever::new(
//!     create_embedding_client(&config)?,
//!     Arc::new(InMemoryVectorStore::new()),
//!     config.retrieval.k,
//! ));
//! retriever.index(&corpus.chunks).await?;
//!
//! let factory = LLMClientFactory::from_config(&config);
//! let generator = Arc::from(factory.create_client(&config.models.generator).await?);
//! let grader = Arc::from(factory.create_client(&config.models.grader).await?);
//!
//! let runner = EvaluationRunner::new(retriever, generator, Arc::new(QaEvaluator::new(grader)), tracker);
//! let report = runner.run(&dataset, PromptVariant::Strict).await?;
//! println!("accuracy: {:.2}", report.summary.accuracy);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `openai` | OpenAI chat and embedding APIs (default) |
//! | `ollama` | Ollama local inference and embeddings (default) |

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Prompt rendering and retrieval-augmented answer generation.
pub mod chain;
/// Command-line parsing and terminal output.
pub mod cli;
/// Labeled example sets and dataset registration.
pub mod dataset;
/// Vector stores.
pub mod db;
/// Correctness grading, evaluation runs and reports.
pub mod eval;
/// Documentation crawling and chunking.
pub mod ingest;
/// LLM provider clients and abstractions.
pub mod llm;
/// Chunking, embeddings and retrieval.
pub mod rag;
/// Experiment-tracking clients.
pub mod tracking;
/// Core types and error handling.
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use chain::{AnswerGenerator, PromptVariant, RagChain};
pub use dataset::DatasetBuilder;
pub use eval::{EvaluationReport, EvaluationRunner, QaEvaluator};
pub use ingest::CorpusIngestor;
pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use rag::Retriever;
pub use tracking::TrackingClient;
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigError, RagcheckConfig};
