//! MLflow REST tracker implementation.
//!
//! Speaks the MLflow 2.0 REST API: the experiment is resolved by name at
//! connect time (created if absent), runs are created under it, and
//! nesting is expressed with the `mlflow.parentRunId` tag. Structured
//! artifacts (`log_dict`) are recorded as JSON-valued tags rather than
//! through the artifact-store protocol.

use async_trait::async_trait;
use nubot_core::{Error, Result};
use serde_json::Value;

use crate::tracker::{RunHandle, RunStatus, RunTracker};

/// Tag key MLflow uses to display a run's name.
const RUN_NAME_TAG: &str = "mlflow.runName";

/// Tag key MLflow uses to nest a run under a parent.
const PARENT_RUN_TAG: &str = "mlflow.parentRunId";

/// Run tracker backed by an MLflow tracking server.
pub struct MlflowTracker {
    base_url: String,
    experiment_id: String,
    client: reqwest::Client,
}

impl MlflowTracker {
    /// Connect to a tracking server and resolve the experiment by name,
    /// creating it when it does not exist yet.
    pub async fn connect(uri: &str, experiment_name: &str) -> Result<Self> {
        let base_url = uri.trim_end_matches('/').to_string();
        let client = reqwest::Client::new();

        let experiment_id =
            Self::resolve_experiment(&client, &base_url, experiment_name).await?;

        Ok(Self {
            base_url,
            experiment_id,
            client,
        })
    }

    /// The resolved experiment id runs are created under.
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    async fn resolve_experiment(
        client: &reqwest::Client,
        base_url: &str,
        name: &str,
    ) -> Result<String> {
        let response = client
            .get(format!("{base_url}/api/2.0/mlflow/experiments/get-by-name"))
            .query(&[("experiment_name", name)])
            .send()
            .await
            .map_err(|e| Error::tracking(format!("Failed to reach tracking server: {e}")))?;

        if response.status().is_success() {
            let body: Value = response
                .json()
                .await
                .map_err(|e| Error::tracking(format!("Failed to parse experiment: {e}")))?;
            return body["experiment"]["experiment_id"]
                .as_str()
                .map(String::from)
                .ok_or_else(|| Error::tracking("Missing experiment_id in response"));
        }

        // Not found: create it
        let response = client
            .post(format!("{base_url}/api/2.0/mlflow/experiments/create"))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .map_err(|e| Error::tracking(format!("Failed to create experiment: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::tracking(format!(
                "Experiment create failed {status}: {text}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::tracking(format!("Failed to parse create response: {e}")))?;
        body["experiment_id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::tracking("Missing experiment_id in create response"))
    }

    async fn post(&self, endpoint: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/api/2.0/mlflow/{endpoint}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::tracking(format!("Tracking request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::tracking(format!(
                "Tracking server error {status} on {endpoint}: {text}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::tracking(format!("Failed to parse tracking response: {e}")))
    }
}

#[async_trait]
impl RunTracker for MlflowTracker {
    async fn start_run(&self, name: &str, parent: Option<&str>) -> Result<Box<dyn RunHandle>> {
        let mut tags = vec![serde_json::json!({ "key": RUN_NAME_TAG, "value": name })];
        if let Some(parent_id) = parent {
            tags.push(serde_json::json!({ "key": PARENT_RUN_TAG, "value": parent_id }));
        }

        let body = serde_json::json!({
            "experiment_id": self.experiment_id,
            "run_name": name,
            "start_time": chrono::Utc::now().timestamp_millis(),
            "tags": tags,
        });

        let response = self.post("runs/create", body).await?;
        let run_id = response["run"]["info"]["run_id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::tracking("Missing run_id in create response"))?;

        Ok(Box::new(MlflowRun {
            run_id,
            base_url: self.base_url.clone(),
            client: self.client.clone(),
        }))
    }
}

/// Handle to an open MLflow run.
pub struct MlflowRun {
    run_id: String,
    base_url: String,
    client: reqwest::Client,
}

impl MlflowRun {
    async fn post(&self, endpoint: &str, body: Value) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/api/2.0/mlflow/{endpoint}", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::tracking(format!("Tracking request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::tracking(format!(
                "Tracking server error {status} on {endpoint}: {text}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl RunHandle for MlflowRun {
    fn id(&self) -> &str {
        &self.run_id
    }

    async fn log_param(&self, key: &str, value: &str) -> Result<()> {
        self.post(
            "runs/log-parameter",
            serde_json::json!({
                "run_id": self.run_id,
                "key": key,
                "value": value,
            }),
        )
        .await
    }

    async fn log_metric(&self, key: &str, value: f64) -> Result<()> {
        self.post(
            "runs/log-metric",
            serde_json::json!({
                "run_id": self.run_id,
                "key": key,
                "value": value,
                "timestamp": chrono::Utc::now().timestamp_millis(),
            }),
        )
        .await
    }

    async fn log_dict(&self, value: &Value, label: &str) -> Result<()> {
        let rendered = serde_json::to_string(value)?;
        self.post(
            "runs/set-tag",
            serde_json::json!({
                "run_id": self.run_id,
                "key": label,
                "value": rendered,
            }),
        )
        .await
    }

    async fn end(&self, status: RunStatus) -> Result<()> {
        self.post(
            "runs/update",
            serde_json::json!({
                "run_id": self.run_id,
                "status": status.as_str(),
                "end_time": chrono::Utc::now().timestamp_millis(),
            }),
        )
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        // connect() would hit the network; check the trimming logic directly
        let trimmed = "http://mlflow:5000/".trim_end_matches('/');
        assert_eq!(trimmed, "http://mlflow:5000");
    }

    #[test]
    fn test_run_create_payload_shape() {
        let tags = vec![
            serde_json::json!({ "key": RUN_NAME_TAG, "value": "retrieval" }),
            serde_json::json!({ "key": PARENT_RUN_TAG, "value": "abc123" }),
        ];
        let body = serde_json::json!({
            "experiment_id": "7",
            "run_name": "retrieval",
            "tags": tags,
        });

        assert_eq!(body["tags"][1]["key"], "mlflow.parentRunId");
        assert_eq!(body["tags"][1]["value"], "abc123");
    }

    // Integration test (requires a tracking server, run manually)
    #[tokio::test]
    #[ignore]
    #[allow(clippy::expect_used)]
    async fn test_mlflow_round_trip_integration() {
        let uri = std::env::var("NUBOT_TRACKING_URI")
            .expect("NUBOT_TRACKING_URI must be set for integration tests");

        let tracker = MlflowTracker::connect(&uri, "rag_experiment").await.unwrap();
        let run = tracker.start_run("RAG_Pipeline", None).await.unwrap();
        run.log_param("query", "integration test").await.unwrap();
        run.log_metric("retrieval_time", 0.5).await.unwrap();
        run.end(RunStatus::Finished).await.unwrap();
    }
}
