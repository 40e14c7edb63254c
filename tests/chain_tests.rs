//! Retrieval and answer generation over an in-memory index

mod common;

use common::mocks::{MockEmbeddingClient, MockLLMClient};
use futures::StreamExt;
use ragcheck::chain::{AnswerGenerator, PromptVariant, RagChain};
use ragcheck::db::InMemoryVectorStore;
use ragcheck::rag::Retriever;
use ragcheck::types::{Chunk, MessageRole};
use rstest::rstest;
use std::sync::Arc;

const QUESTION: &str = "How do I trace a dataset run?";

fn chunks() -> Vec<Chunk> {
    vec![
        Chunk::new("https://docs/prompts", 0, "Prompt templates live in the hub.".into()),
        Chunk::new("https://docs/tracing", 0, "Trace spans and trace trees.".into()),
        Chunk::new("https://docs/misc", 0, "Nothing relevant here.".into()),
        Chunk::new("https://docs/datasets", 3, "Trace a dataset with one call.".into()),
        Chunk::new("https://docs/misc", 1, "Still nothing relevant.".into()),
    ]
}

async fn indexed(embedder: Arc<MockEmbeddingClient>, k: usize) -> Arc<Retriever> {
    let retriever = Retriever::new(embedder, Arc::new(InMemoryVectorStore::new()), k)
        .with_batch_size(2);
    assert_eq!(retriever.index(&chunks()).await.unwrap(), 5);
    Arc::new(retriever)
}

fn keywords() -> Arc<MockEmbeddingClient> {
    Arc::new(MockEmbeddingClient::new(&["trace", "dataset", "prompt"]))
}

#[tokio::test]
async fn test_retrieve_returns_k_most_similar_first() {
    let embedder = keywords();
    let retriever = indexed(embedder.clone(), 2).await;
    // five chunks in batches of two
    assert_eq!(embedder.calls(), 3);

    let results = retriever.retrieve(QUESTION).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.content, "Trace a dataset with one call.");
    assert_eq!(results[0].chunk.index, 3);
    assert_eq!(results[1].chunk.content, "Trace spans and trace trees.");
    assert!(results[0].score >= results[1].score);
    assert!(results[0].chunk.embedding.is_none());
}

#[tokio::test]
async fn test_retrieve_returns_everything_when_corpus_is_smaller_than_k() {
    let retriever = indexed(keywords(), 10).await;

    let results = retriever.retrieve(QUESTION).await.unwrap();

    assert_eq!(results.len(), 5);
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[tokio::test]
async fn test_retrieve_before_indexing_is_empty() {
    let embedder = keywords();
    let retriever = Retriever::new(embedder.clone(), Arc::new(InMemoryVectorStore::new()), 4);

    assert!(retriever.retrieve(QUESTION).await.unwrap().is_empty());
    assert_eq!(embedder.calls(), 0);
}

#[rstest]
#[case::baseline(PromptVariant::Baseline, 3)]
#[case::strict(PromptVariant::Strict, 4)]
#[tokio::test]
async fn test_invoke_conditions_answer_on_retrieved_context(
    #[case] variant: PromptVariant,
    #[case] message_count: usize,
) {
    let llm = MockLLMClient::new("Call the tracer on the dataset.");
    let chain = RagChain::new(
        indexed(keywords(), 2).await,
        AnswerGenerator::new(Arc::new(llm.clone()), variant),
    );

    let output = chain.invoke(QUESTION).await.unwrap();

    assert_eq!(output.answer, "Call the tracer on the dataset.");
    let urls: Vec<&str> = output.sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls, vec!["https://docs/datasets", "https://docs/tracing"]);
    assert_eq!(output.sources[0].chunk_index, 3);

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    let messages = &requests[0];
    assert_eq!(messages.len(), message_count);
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(
        messages[1].content,
        "Trace a dataset with one call.\nTrace spans and trace trees."
    );
    assert_eq!(messages[2].role, MessageRole::User);
    assert_eq!(messages[2].content, QUESTION);
    assert_eq!(chain.generator().variant(), variant);
}

#[tokio::test]
async fn test_stream_yields_answer_incrementally() {
    let answer = "Wrap the function with the tracing decorator.";
    let chain = RagChain::new(
        indexed(keywords(), 2).await,
        AnswerGenerator::new(Arc::new(MockLLMClient::new(answer)), PromptVariant::Baseline),
    );

    let (results, mut stream) = chain.stream(QUESTION).await.unwrap();
    assert_eq!(results.len(), 2);

    let mut deltas = Vec::new();
    while let Some(delta) = stream.next().await {
        deltas.push(delta.unwrap());
    }
    assert!(deltas.len() > 1);
    assert_eq!(deltas.concat(), answer);
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let chain = RagChain::new(
        indexed(keywords(), 2).await,
        AnswerGenerator::new(Arc::new(MockLLMClient::failing()), PromptVariant::Strict),
    );

    assert!(chain.invoke(QUESTION).await.is_err());
}
