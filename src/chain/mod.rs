//! Retrieval-augmented answer generation.
//!
//! [`AnswerGenerator`] renders the prompt and streams the chat model's reply;
//! [`RagChain`] puts the retriever in front of it.

pub mod prompt;

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tracing::debug;

use crate::llm::client::{LLMClient, TextStream};
use crate::rag::retriever::Retriever;
use crate::types::{Result, SearchResult, Source};

pub use prompt::{PromptTemplate, PromptVariant};

pub struct AnswerGenerator {
    llm: Arc<dyn LLMClient>,
    template: PromptTemplate,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LLMClient>, variant: PromptVariant) -> Self {
        Self {
            llm,
            template: PromptTemplate::new(variant),
        }
    }

    pub fn variant(&self) -> PromptVariant {
        self.template.variant()
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Stream text deltas as the model produces them
    pub async fn stream(&self, question: &str, context: &str) -> Result<TextStream> {
        let messages = self.template.render(question, context, Utc::now());
        debug!(
            variant = %self.template.variant(),
            model = self.llm.model_name(),
            "Generating answer"
        );
        self.llm.stream_with_messages(&messages).await
    }

    /// Consume the stream into the full answer
    pub async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let mut stream = self.stream(question, context).await?;
        let mut answer = String::new();
        while let Some(delta) = stream.next().await {
            answer.push_str(&delta?);
        }
        Ok(answer)
    }
}

/// Answer plus the chunks it was conditioned on.
#[derive(Debug, Clone)]
pub struct ChainOutput {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// Retrieval followed by generation.
pub struct RagChain {
    retriever: Arc<Retriever>,
    generator: AnswerGenerator,
}

impl RagChain {
    pub fn new(retriever: Arc<Retriever>, generator: AnswerGenerator) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Retrieve context for `question` and start streaming the answer
    pub async fn stream(&self, question: &str) -> Result<(Vec<SearchResult>, TextStream)> {
        let results = self.retriever.retrieve(question).await?;
        let context = Retriever::format_context(&results);
        let stream = self.generator.stream(question, &context).await?;
        Ok((results, stream))
    }

    pub async fn invoke(&self, question: &str) -> Result<ChainOutput> {
        let results = self.retriever.retrieve(question).await?;
        let context = Retriever::format_context(&results);
        let answer = self.generator.generate(question, &context).await?;

        Ok(ChainOutput {
            answer,
            sources: results.iter().map(Source::from).collect(),
        })
    }
}
