//! LangSmith-compatible REST tracking client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use super::{RunCreate, RunUpdate, TrackingClient};
use crate::types::{AppError, Example, Feedback, Result};

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

pub struct RemoteTracker {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteTracker {
    pub fn new(endpoint: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|_| AppError::Configuration("Tracking API key is not a valid header".into()))?;
        headers.insert("x-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Tracking(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Tracking(format!("{} failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Tracking(format!(
                "{} returned HTTP {}: {}",
                what, status, body
            )));
        }

        debug!(%status, "{}", what);
        Ok(response)
    }

    async fn post_for_id(&self, path: &str, body: serde_json::Value, what: &str) -> Result<String> {
        let response = self
            .send(self.client.post(self.url(path)).json(&body), what)
            .await?;
        let created: Created = response
            .json()
            .await
            .map_err(|e| AppError::Tracking(format!("{}: unexpected response: {}", what, e)))?;
        Ok(created.id)
    }
}

#[async_trait]
impl TrackingClient for RemoteTracker {
    async fn create_dataset(&self, name: &str, description: &str) -> Result<String> {
        self.post_for_id(
            "/datasets",
            json!({ "name": name, "description": description, "data_type": "kv" }),
            "Create dataset",
        )
        .await
    }

    async fn create_example(&self, dataset_id: &str, example: &Example) -> Result<String> {
        self.post_for_id(
            "/examples",
            json!({
                "inputs": example.inputs(),
                "outputs": example.outputs(),
                "dataset_id": dataset_id,
            }),
            "Create example",
        )
        .await
    }

    async fn create_project(
        &self,
        name: &str,
        reference_dataset_id: Option<&str>,
    ) -> Result<String> {
        self.post_for_id(
            "/sessions",
            json!({ "name": name, "reference_dataset_id": reference_dataset_id }),
            "Create project",
        )
        .await
    }

    async fn create_run(&self, run: &RunCreate) -> Result<()> {
        self.send(self.client.post(self.url("/runs")).json(run), "Create run")
            .await?;
        Ok(())
    }

    async fn update_run(&self, run_id: Uuid, update: &RunUpdate) -> Result<()> {
        self.send(
            self.client
                .patch(self.url(&format!("/runs/{}", run_id)))
                .json(update),
            "Update run",
        )
        .await?;
        Ok(())
    }

    async fn create_feedback(&self, run_id: Uuid, feedback: &Feedback) -> Result<()> {
        self.send(
            self.client.post(self.url("/feedback")).json(&json!({
                "run_id": run_id,
                "key": feedback.key,
                "score": feedback.score,
                "comment": feedback.comment,
            })),
            "Create feedback",
        )
        .await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let tracker =
            RemoteTracker::new("https://api.smith.langchain.com/", "key", Duration::from_secs(5))
                .unwrap();
        assert_eq!(tracker.endpoint(), "https://api.smith.langchain.com");
        assert_eq!(
            tracker.url("/datasets"),
            "https://api.smith.langchain.com/datasets"
        );
    }

    #[test]
    fn test_invalid_api_key_header() {
        let result = RemoteTracker::new("http://localhost", "bad\nkey", Duration::from_secs(5));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
