//! Experiment tracking.
//!
//! Datasets, evaluation projects, runs and feedback are recorded through
//! [`TrackingClient`]. [`remote::RemoteTracker`] speaks the LangSmith REST
//! API; [`memory::InMemoryTracker`] keeps everything in process for offline
//! use and tests.

pub mod memory;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Example, Feedback, Result};
use crate::utils::toml_config::{RagcheckConfig, TrackingBackend};

pub use memory::InMemoryTracker;
pub use remote::RemoteTracker;

/// Run start as sent to the tracking store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCreate {
    pub id: Uuid,
    pub name: String,
    pub run_type: String,
    pub inputs: serde_json::Value,
    pub start_time: DateTime<Utc>,
    pub session_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_example_id: Option<String>,
}

/// Run completion: outputs on success, error text on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<serde_json::Value>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait TrackingClient: Send + Sync {
    /// Create a dataset and return its id
    async fn create_dataset(&self, name: &str, description: &str) -> Result<String>;

    /// Register one example under a dataset and return its id
    async fn create_example(&self, dataset_id: &str, example: &Example) -> Result<String>;

    /// Create a project (session) for one evaluation pass and return its id
    async fn create_project(&self, name: &str, reference_dataset_id: Option<&str>)
        -> Result<String>;

    async fn create_run(&self, run: &RunCreate) -> Result<()>;

    async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()>;

    async fn create_feedback(&self, run_id: Uuid, feedback: &Feedback) -> Result<()>;

    fn backend_name(&self) -> &'static str;
}

/// Build the tracker selected by `[tracking]`
pub fn create_tracker(config: &RagcheckConfig) -> Result<Arc<dyn TrackingClient>> {
    match config.tracking.backend {
        TrackingBackend::Memory => Ok(Arc::new(InMemoryTracker::new())),
        TrackingBackend::Remote => {
            let api_key = config.tracking_api_key()?;
            Ok(Arc::new(RemoteTracker::new(
                &config.tracking_endpoint(),
                &api_key,
                Duration::from_secs(config.tracking.timeout_secs),
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_memory_tracker() {
        let mut config = RagcheckConfig::default();
        config.tracking.backend = TrackingBackend::Memory;

        let tracker = create_tracker(&config).unwrap();
        assert_eq!(tracker.backend_name(), "memory");
    }

    #[test]
    fn test_remote_tracker_requires_api_key() {
        let mut config = RagcheckConfig::default();
        config.tracking.api_key_env = "RAGCHECK_TEST_UNSET_TRACKING_KEY".to_string();

        let result = create_tracker(&config);
        assert!(matches!(
            result,
            Err(crate::types::AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_run_update_skips_absent_fields() {
        let update = RunUpdate {
            outputs: None,
            end_time: Utc::now(),
            error: Some("boom".to_string()),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("outputs").is_none());
        assert_eq!(json["error"], "boom");
    }
}
