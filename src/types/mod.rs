use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============= Dataset Types =============

/// A labeled question with its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub question: String,
    #[serde(alias = "reference_answer")]
    pub answer: String,
}

impl Example {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Input fields as registered with the tracking store
    pub fn inputs(&self) -> serde_json::Value {
        serde_json::json!({ "question": self.question })
    }

    /// Expected-output fields as registered with the tracking store
    pub fn outputs(&self) -> serde_json::Value {
        serde_json::json!({ "answer": self.answer })
    }
}

/// An example after registration, carrying the id the tracking store assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetExample {
    pub id: String,
    pub index: usize,
    pub example: Example,
}

/// A named, ordered collection of registered examples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    pub name: String,
    pub examples: Vec<DatasetExample>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

// ============= Corpus Types =============

/// A crawled page converted to plain text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub title: Option<String>,
    pub content: String,
}

/// A token-bounded slice of one document's text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub source: String,
    /// Position of this chunk within its document
    pub index: usize,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    pub fn new(source: &str, index: usize, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            index,
            content,
            embedding: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f32,
}

/// Where a retrieved chunk came from, as kept in run records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub chunk_index: usize,
    pub relevance_score: f32,
}

impl From<&SearchResult> for Source {
    fn from(result: &SearchResult) -> Self {
        Self {
            url: result.chunk.source.clone(),
            chunk_index: result.chunk.index,
            relevance_score: result.score,
        }
    }
}

// ============= Chat Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// ============= Evaluation Types =============

/// A scored judgment attached to one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub key: String,
    /// 1.0 for correct, 0.0 for incorrect, `None` when the grader gave no verdict
    pub score: Option<f64>,
    pub comment: Option<String>,
}

/// One execution of the answer generator against one example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub example_id: String,
    pub example_index: usize,
    pub question: String,
    pub reference_answer: String,
    pub answer: Option<String>,
    pub sources: Vec<Source>,
    pub feedback: Option<Feedback>,
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl RunRecord {
    pub fn score(&self) -> Option<f64> {
        self.feedback.as_ref().and_then(|f| f.score)
    }

    pub fn passed(&self) -> bool {
        self.score().is_some_and(|s| s >= 1.0)
    }

    pub fn latency_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Tracking service error: {0}")]
    Tracking(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_field_mapping() {
        let example = Example::new("What is LangChain?", "A framework.");
        assert_eq!(example.inputs()["question"], "What is LangChain?");
        assert_eq!(example.outputs()["answer"], "A framework.");
    }

    #[test]
    fn test_example_accepts_reference_answer_alias() {
        let example: Example =
            serde_json::from_str(r#"{"question": "q", "reference_answer": "a"}"#).unwrap();
        assert_eq!(example.answer, "a");
    }

    #[test]
    fn test_run_record_pass() {
        let now = Utc::now();
        let mut record = RunRecord {
            id: Uuid::new_v4(),
            example_id: "ex-1".to_string(),
            example_index: 0,
            question: "q".to_string(),
            reference_answer: "a".to_string(),
            answer: Some("a".to_string()),
            sources: vec![],
            feedback: None,
            error: None,
            start_time: now,
            end_time: now,
        };
        assert!(!record.passed());

        record.feedback = Some(Feedback {
            key: "correctness".to_string(),
            score: Some(1.0),
            comment: None,
        });
        assert!(record.passed());
        assert_eq!(record.latency_ms(), 0);
    }
}
