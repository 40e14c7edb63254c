//! Evaluation reports and cross-variant comparison.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::PromptVariant;
use crate::types::{AppError, Result, RunRecord};

/// Aggregate counts over one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// The grader replied without a verdict
    pub ungraded: usize,
    pub errors: usize,
    /// passed / total
    pub accuracy: f64,
}

impl ReportSummary {
    pub fn from_runs(runs: &[RunRecord]) -> Self {
        let mut summary = ReportSummary {
            total: runs.len(),
            ..Default::default()
        };

        for run in runs {
            match run.score() {
                Some(score) if score >= 1.0 => summary.passed += 1,
                Some(_) => summary.failed += 1,
                None if run.error.is_some() => summary.errors += 1,
                None => summary.ungraded += 1,
            }
        }

        if summary.total > 0 {
            summary.accuracy = summary.passed as f64 / summary.total as f64;
        }
        summary
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub project_name: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub variant: PromptVariant,
    pub generator_model: String,
    pub grader_model: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One record per example, in dataset order
    pub runs: Vec<RunRecord>,
    pub summary: ReportSummary,
}

impl EvaluationReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Internal(format!("Failed to serialize report: {}", e)))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_reports(std::slice::from_ref(self), path)
    }
}

/// Write reports as a JSON array
pub fn save_reports<P: AsRef<Path>>(reports: &[EvaluationReport], path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(reports)
        .map_err(|e| AppError::Internal(format!("Failed to serialize reports: {}", e)))?;
    std::fs::write(path, json)
        .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))
}

/// One example whose score differs between two reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub example_index: usize,
    pub question: String,
    pub before: Option<f64>,
    pub after: Option<f64>,
}

impl ScoreChange {
    /// Missing scores (errors, ungraded replies) count as 0.
    pub fn improved(&self) -> bool {
        self.after.unwrap_or(0.0) > self.before.unwrap_or(0.0)
    }

    pub fn regressed(&self) -> bool {
        self.after.unwrap_or(0.0) < self.before.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline_project: String,
    pub candidate_project: String,
    pub baseline_accuracy: f64,
    pub candidate_accuracy: f64,
    pub changes: Vec<ScoreChange>,
    /// Examples present in only one of the reports
    pub unmatched: usize,
}

impl Comparison {
    pub fn improved(&self) -> usize {
        self.changes.iter().filter(|c| c.improved()).count()
    }

    pub fn regressed(&self) -> usize {
        self.changes.iter().filter(|c| c.regressed()).count()
    }
}

/// Line up two reports per example and list the examples whose score changed.
///
/// Examples are matched by id when both reports share a dataset and by
/// question text otherwise.
pub fn compare(baseline: &EvaluationReport, candidate: &EvaluationReport) -> Comparison {
    let same_dataset = baseline.dataset_id == candidate.dataset_id;
    let key = |run: &RunRecord| {
        if same_dataset {
            run.example_id.clone()
        } else {
            run.question.clone()
        }
    };

    let candidate_runs: HashMap<String, &RunRecord> =
        candidate.runs.iter().map(|r| (key(r), r)).collect();

    let mut changes = Vec::new();
    let mut matched = 0;
    for before in &baseline.runs {
        let Some(after) = candidate_runs.get(&key(before)) else {
            continue;
        };
        matched += 1;
        if before.score() != after.score() {
            changes.push(ScoreChange {
                example_index: before.example_index,
                question: before.question.clone(),
                before: before.score(),
                after: after.score(),
            });
        }
    }

    Comparison {
        baseline_project: baseline.project_name.clone(),
        candidate_project: candidate.project_name.clone(),
        baseline_accuracy: baseline.summary.accuracy,
        candidate_accuracy: candidate.summary.accuracy,
        changes,
        unmatched: (baseline.runs.len() - matched) + (candidate.runs.len() - matched),
    }
}
