//! Labeled question/answer datasets.
//!
//! The built-in examples cover the LangSmith documentation; a JSON file of
//! `{"question": ..., "answer": ...}` objects can replace them.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::tracking::TrackingClient;
use crate::types::{AppError, Dataset, DatasetExample, Example, Result};

/// The seven documentation questions with their reference answers
pub fn default_examples() -> Vec<Example> {
    vec![
        Example::new(
            "What is LangChain?",
            "LangChain is an open-source framework for building applications using large language models. It is also the name of the company building LangSmith.",
        ),
        Example::new(
            "How might I query for all runs in a project?",
            "client.list_runs(project_name='my-project-name'), or in TypeScript, client.ListRuns({projectName: 'my-project-anme'})",
        ),
        Example::new(
            "What's a langsmith dataset?",
            "A LangSmith dataset is a collection of examples. Each example contains inputs and optional expected outputs or references for that data point.",
        ),
        Example::new(
            "How do I use a traceable decorator?",
            r#"The traceable decorator is available in the langsmith python SDK. To use, configure your environment with your API key,
import the required function, decorate your function, and then call the function. Below is an example:
```python
from langsmith.run_helpers import traceable
@traceable(run_type="chain") # or "llm", etc.
def my_function(input_param):
    # Function logic goes here
    return output
result = my_function(input_param)
```"#,
        ),
        Example::new(
            "Can I trace my Llama V2 llm?",
            "So long as you are using one of LangChain's LLM implementations, all your calls can be traced",
        ),
        Example::new(
            "Why do I have to set environment variables?",
            "Environment variables can tell your LangChain application to perform tracing and contain the information necessary to authenticate to LangSmith. While there are other ways to connect, environment variables tend to be the simplest way to configure your application.",
        ),
        Example::new(
            "How do I move my project between organizations?",
            "LangSmith doesn't directly support moving projects between organizations.",
        ),
    ]
}

/// Read examples from a JSON array of `{question, answer}` objects
pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<Example>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let examples: Vec<Example> = serde_json::from_str(&content).map_err(|e| {
        AppError::InvalidInput(format!("Invalid examples file {}: {}", path.display(), e))
    })?;

    if examples.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "{} contains no examples",
            path.display()
        )));
    }
    Ok(examples)
}

/// Registers examples as a freshly named dataset in the tracking store.
pub struct DatasetBuilder {
    tracker: Arc<dyn TrackingClient>,
    prefix: String,
    description: String,
}

impl DatasetBuilder {
    pub fn new(tracker: Arc<dyn TrackingClient>) -> Self {
        Self {
            tracker,
            prefix: "Retrieval QA Questions".to_string(),
            description: "Questions and answers about the documentation".to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// `"<prefix> <uuid-v4>"`, different on every call
    pub fn unique_name(&self) -> String {
        format!("{} {}", self.prefix, Uuid::new_v4())
    }

    /// Create the dataset and register one example per pair, preserving order
    pub async fn build(&self, examples: &[Example]) -> Result<Dataset> {
        let name = self.unique_name();
        let id = self.tracker.create_dataset(&name, &self.description).await?;

        let mut registered = Vec::with_capacity(examples.len());
        for (index, example) in examples.iter().enumerate() {
            let example_id = self.tracker.create_example(&id, example).await?;
            registered.push(DatasetExample {
                id: example_id,
                index,
                example: example.clone(),
            });
        }

        info!(
            dataset = %name,
            examples = registered.len(),
            backend = self.tracker.backend_name(),
            "Created dataset"
        );

        Ok(Dataset {
            id,
            name,
            examples: registered,
        })
    }
}
