//! Correctness evaluation over a dataset.
//!
//! - [`grader`] - the "qa" LLM-as-judge evaluator
//! - [`runner`] - retrieve, generate, grade and record per example
//! - [`report`] - aggregated results and comparison across prompt variants

pub mod grader;
pub mod report;
pub mod runner;

pub use grader::{QaEvaluator, Verdict};
pub use report::{compare, save_reports, Comparison, EvaluationReport, ReportSummary, ScoreChange};
pub use runner::EvaluationRunner;
