//! Runs the RAG chain over a dataset and grades every answer.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::grader::QaEvaluator;
use super::report::{EvaluationReport, ReportSummary};
use crate::chain::{AnswerGenerator, PromptVariant, RagChain};
use crate::llm::client::LLMClient;
use crate::rag::retriever::Retriever;
use crate::tracking::{RunCreate, RunUpdate, TrackingClient};
use crate::types::{AppError, Dataset, DatasetExample, Result, RunRecord};

/// Name the tracking store shows for each example's run
const RUN_NAME: &str = "RetrievalQA";

pub struct EvaluationRunner {
    retriever: Arc<Retriever>,
    generator_llm: Arc<dyn LLMClient>,
    evaluator: Arc<QaEvaluator>,
    tracker: Arc<dyn TrackingClient>,
    max_concurrency: usize,
}

impl EvaluationRunner {
    pub fn new(
        retriever: Arc<Retriever>,
        generator_llm: Arc<dyn LLMClient>,
        evaluator: Arc<QaEvaluator>,
        tracker: Arc<dyn TrackingClient>,
    ) -> Self {
        Self {
            retriever,
            generator_llm,
            evaluator,
            tracker,
            max_concurrency: 4,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// `"<variant>-<8 hex chars>"`
    pub fn project_name(variant: PromptVariant) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{}-{}", variant, &id[..8])
    }

    /// Evaluate one prompt variant over every example of `dataset`.
    ///
    /// Failing examples are recorded with their error; only failing to create
    /// the project aborts the run.
    pub async fn run(&self, dataset: &Dataset, variant: PromptVariant) -> Result<EvaluationReport> {
        if dataset.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Dataset '{}' has no examples",
                dataset.name
            )));
        }

        let project_name = Self::project_name(variant);
        self.tracker
            .create_project(&project_name, Some(&dataset.id))
            .await?;
        info!(
            project = %project_name,
            dataset = %dataset.name,
            examples = dataset.len(),
            "Starting evaluation"
        );

        let chain = RagChain::new(
            self.retriever.clone(),
            AnswerGenerator::new(self.generator_llm.clone(), variant),
        );

        let started_at = Utc::now();
        // `buffered` keeps results in dataset order
        let runs: Vec<RunRecord> = stream::iter(dataset.examples.iter())
            .map(|example| self.run_example(&chain, &project_name, example))
            .buffered(self.max_concurrency)
            .collect()
            .await;
        let finished_at = Utc::now();

        let summary = ReportSummary::from_runs(&runs);
        info!(
            project = %project_name,
            passed = summary.passed,
            failed = summary.failed,
            errors = summary.errors,
            "Evaluation finished"
        );

        Ok(EvaluationReport {
            project_name,
            dataset_id: dataset.id.clone(),
            dataset_name: dataset.name.clone(),
            variant,
            generator_model: self.generator_llm.model_name().to_string(),
            grader_model: self.evaluator.model_name().to_string(),
            started_at,
            finished_at,
            runs,
            summary,
        })
    }

    async fn run_example(
        &self,
        chain: &RagChain,
        project_name: &str,
        example: &DatasetExample,
    ) -> RunRecord {
        let run_id = Uuid::new_v4();
        let start_time = Utc::now();
        let mut errors: Vec<String> = Vec::new();

        let run = RunCreate {
            id: run_id,
            name: RUN_NAME.to_string(),
            run_type: "chain".to_string(),
            inputs: example.example.inputs(),
            start_time,
            session_name: project_name.to_string(),
            reference_example_id: Some(example.id.clone()),
        };
        let run_recorded = match self.tracker.create_run(&run).await {
            Ok(()) => true,
            Err(e) => {
                errors.push(e.to_string());
                false
            }
        };

        let (answer, sources) = match chain.invoke(&example.example.question).await {
            Ok(output) => (Some(output.answer), output.sources),
            Err(e) => {
                errors.push(e.to_string());
                (None, Vec::new())
            }
        };

        let feedback = match &answer {
            Some(answer) => match self
                .evaluator
                .evaluate(&example.example.question, &example.example.answer, answer)
                .await
            {
                Ok(feedback) => Some(feedback),
                Err(e) => {
                    errors.push(format!("Grading failed: {}", e));
                    None
                }
            },
            None => None,
        };

        let end_time = Utc::now();
        if run_recorded {
            let update = RunUpdate {
                outputs: answer.as_ref().map(|a| json!({ "answer": a })),
                end_time,
                error: (!errors.is_empty()).then(|| errors.join("; ")),
            };
            if let Err(e) = self.tracker.update_run(run_id, &update).await {
                errors.push(e.to_string());
            }
            if let Some(feedback) = &feedback {
                if let Err(e) = self.tracker.create_feedback(run_id, feedback).await {
                    errors.push(e.to_string());
                }
            }
        }

        let error = (!errors.is_empty()).then(|| errors.join("; "));
        if let Some(error) = &error {
            warn!(example = example.index, "Example failed: {}", error);
        }

        RunRecord {
            id: run_id,
            example_id: example.id.clone(),
            example_index: example.index,
            question: example.example.question.clone(),
            reference_answer: example.example.answer.clone(),
            answer,
            sources,
            feedback,
            error,
            start_time,
            end_time,
        }
    }
}
