//! Process-local tracking store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{RunCreate, RunUpdate, TrackingClient};
use crate::types::{AppError, Example, Feedback, Result};

#[derive(Debug, Clone)]
pub struct TrackedDataset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub examples: Vec<(String, Example)>,
}

#[derive(Debug, Clone)]
pub struct TrackedProject {
    pub id: String,
    pub name: String,
    pub reference_dataset_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrackedRun {
    pub run: RunCreate,
    pub update: Option<RunUpdate>,
    pub feedback: Vec<Feedback>,
}

#[derive(Default)]
struct State {
    datasets: Vec<TrackedDataset>,
    projects: Vec<TrackedProject>,
    runs: HashMap<Uuid, TrackedRun>,
}

/// Keeps datasets, projects, runs and feedback in memory.
#[derive(Default)]
pub struct InMemoryTracker {
    state: RwLock<State>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn datasets(&self) -> Vec<TrackedDataset> {
        self.state.read().datasets.clone()
    }

    pub fn projects(&self) -> Vec<TrackedProject> {
        self.state.read().projects.clone()
    }

    /// Runs recorded under a project, in start order
    pub fn runs_in(&self, project_name: &str) -> Vec<TrackedRun> {
        let mut runs: Vec<TrackedRun> = self
            .state
            .read()
            .runs
            .values()
            .filter(|r| r.run.session_name == project_name)
            .cloned()
            .collect();
        runs.sort_by_key(|r| r.run.start_time);
        runs
    }

    pub fn run(&self, run_id: Uuid) -> Option<TrackedRun> {
        self.state.read().runs.get(&run_id).cloned()
    }
}

#[async_trait]
impl TrackingClient for InMemoryTracker {
    async fn create_dataset(&self, name: &str, description: &str) -> Result<String> {
        let mut state = self.state.write();
        if state.datasets.iter().any(|d| d.name == name) {
            return Err(AppError::Tracking(format!(
                "Dataset '{}' already exists",
                name
            )));
        }

        let id = Uuid::new_v4().to_string();
        state.datasets.push(TrackedDataset {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            examples: Vec::new(),
        });
        Ok(id)
    }

    async fn create_example(&self, dataset_id: &str, example: &Example) -> Result<String> {
        let mut state = self.state.write();
        let dataset = state
            .datasets
            .iter_mut()
            .find(|d| d.id == dataset_id)
            .ok_or_else(|| AppError::NotFound(format!("Dataset '{}' not found", dataset_id)))?;

        let id = Uuid::new_v4().to_string();
        dataset.examples.push((id.clone(), example.clone()));
        Ok(id)
    }

    async fn create_project(
        &self,
        name: &str,
        reference_dataset_id: Option<&str>,
    ) -> Result<String> {
        let mut state = self.state.write();
        if state.projects.iter().any(|p| p.name == name) {
            return Err(AppError::Tracking(format!(
                "Project '{}' already exists",
                name
            )));
        }

        let id = Uuid::new_v4().to_string();
        state.projects.push(TrackedProject {
            id: id.clone(),
            name: name.to_string(),
            reference_dataset_id: reference_dataset_id.map(str::to_string),
        });
        Ok(id)
    }

    async fn create_run(&self, run: &RunCreate) -> Result<()> {
        self.state.write().runs.insert(
            run.id,
            TrackedRun {
                run: run.clone(),
                update: None,
                feedback: Vec::new(),
            },
        );
        Ok(())
    }

    async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()> {
        let mut state = self.state.write();
        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| AppError::NotFound(format!("Run '{}' not found", run_id)))?;
        run.update = Some(update.clone());
        Ok(())
    }

    async fn create_feedback(&self, run_id: Uuid, feedback: &Feedback) -> Result<()> {
        let mut state = self.state.write();
        let run = state
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| AppError::NotFound(format!("Run '{}' not found", run_id)))?;
        run.feedback.push(feedback.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_dataset_and_examples() {
        let tracker = InMemoryTracker::new();
        let id = tracker.create_dataset("QA", "questions").await.unwrap();
        tracker
            .create_example(&id, &Example::new("q1", "a1"))
            .await
            .unwrap();
        tracker
            .create_example(&id, &Example::new("q2", "a2"))
            .await
            .unwrap();

        let datasets = tracker.datasets();
        assert_eq!(datasets.len(), 1);
        assert_eq!(datasets[0].examples.len(), 2);
        assert_eq!(datasets[0].examples[1].1.question, "q2");
    }

    #[tokio::test]
    async fn test_duplicate_dataset_name_rejected() {
        let tracker = InMemoryTracker::new();
        tracker.create_dataset("QA", "").await.unwrap();
        assert!(matches!(
            tracker.create_dataset("QA", "").await,
            Err(AppError::Tracking(_))
        ));
    }

    #[tokio::test]
    async fn test_example_for_unknown_dataset() {
        let tracker = InMemoryTracker::new();
        assert!(matches!(
            tracker.create_example("nope", &Example::new("q", "a")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_run_lifecycle() {
        let tracker = InMemoryTracker::new();
        tracker.create_project("baseline-1234", None).await.unwrap();

        let run_id = Uuid::new_v4();
        tracker
            .create_run(&RunCreate {
                id: run_id,
                name: "rag".to_string(),
                run_type: "chain".to_string(),
                inputs: serde_json::json!({"question": "q"}),
                start_time: Utc::now(),
                session_name: "baseline-1234".to_string(),
                reference_example_id: None,
            })
            .await
            .unwrap();
        tracker
            .update_run(
                run_id,
                &RunUpdate {
                    outputs: Some(serde_json::json!({"answer": "a"})),
                    end_time: Utc::now(),
                    error: None,
                },
            )
            .await
            .unwrap();
        tracker
            .create_feedback(
                run_id,
                &Feedback {
                    key: "correctness".to_string(),
                    score: Some(1.0),
                    comment: None,
                },
            )
            .await
            .unwrap();

        let runs = tracker.runs_in("baseline-1234");
        assert_eq!(runs.len(), 1);
        assert!(runs[0].update.is_some());
        assert_eq!(runs[0].feedback[0].score, Some(1.0));
        assert!(tracker.runs_in("other").is_empty());
    }
}
