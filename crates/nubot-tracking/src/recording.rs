//! In-memory trackers: a recording tracker for assertions and a no-op
//! tracker for when no tracking server is configured.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nubot_core::{Error, Result};
use serde_json::Value;

use crate::tracker::{RunHandle, RunStatus, RunTracker};

/// Everything recorded about a single run.
#[derive(Debug, Clone, Default)]
pub struct RecordedRun {
    /// The run id.
    pub id: String,

    /// Run name as passed to `start_run`.
    pub name: String,

    /// Parent run id for nested runs.
    pub parent: Option<String>,

    /// Logged parameters, in order.
    pub params: Vec<(String, String)>,

    /// Logged metrics, in order.
    pub metrics: Vec<(String, f64)>,

    /// Logged structured artifacts: (label, value).
    pub dicts: Vec<(String, Value)>,

    /// Terminal status, None while the run is still open.
    pub status: Option<RunStatus>,
}

impl RecordedRun {
    /// Look up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a metric by key.
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
    }
}

/// Run tracker that records every call in memory.
///
/// Clones share the same underlying store, so a test can hand one clone
/// to the pipeline and inspect the other afterwards.
#[derive(Clone, Default)]
pub struct RecordingTracker {
    runs: Arc<Mutex<Vec<RecordedRun>>>,
}

impl RecordingTracker {
    /// Create an empty recording tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all runs recorded so far.
    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The recorded runs with the given name.
    pub fn runs_named(&self, name: &str) -> Vec<RecordedRun> {
        self.runs()
            .into_iter()
            .filter(|r| r.name == name)
            .collect()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<RecordedRun>>> {
        self.runs
            .lock()
            .map_err(|e| Error::tracking(format!("recording store poisoned: {e}")))
    }
}

#[async_trait]
impl RunTracker for RecordingTracker {
    async fn start_run(&self, name: &str, parent: Option<&str>) -> Result<Box<dyn RunHandle>> {
        let mut runs = self.lock()?;
        let id = format!("run-{}", runs.len());
        runs.push(RecordedRun {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.map(String::from),
            ..RecordedRun::default()
        });

        Ok(Box::new(RecordingRun {
            id,
            store: self.clone(),
        }))
    }
}

/// Handle writing into a [`RecordingTracker`]'s store.
pub struct RecordingRun {
    id: String,
    store: RecordingTracker,
}

impl RecordingRun {
    fn with_run(&self, f: impl FnOnce(&mut RecordedRun)) -> Result<()> {
        let mut runs = self.store.lock()?;
        let run = runs
            .iter_mut()
            .find(|r| r.id == self.id)
            .ok_or_else(|| Error::tracking(format!("unknown run id {}", self.id)))?;
        f(run);
        Ok(())
    }
}

#[async_trait]
impl RunHandle for RecordingRun {
    fn id(&self) -> &str {
        &self.id
    }

    async fn log_param(&self, key: &str, value: &str) -> Result<()> {
        self.with_run(|run| run.params.push((key.to_string(), value.to_string())))
    }

    async fn log_metric(&self, key: &str, value: f64) -> Result<()> {
        self.with_run(|run| run.metrics.push((key.to_string(), value)))
    }

    async fn log_dict(&self, value: &Value, label: &str) -> Result<()> {
        self.with_run(|run| run.dicts.push((label.to_string(), value.clone())))
    }

    async fn end(&self, status: RunStatus) -> Result<()> {
        self.with_run(|run| run.status = Some(status))
    }
}

/// Run tracker that discards everything.
///
/// Used when no tracking URI is configured; the pipeline's logging calls
/// succeed without side effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracker;

impl NoopTracker {
    /// Create a no-op tracker.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RunTracker for NoopTracker {
    async fn start_run(&self, _name: &str, _parent: Option<&str>) -> Result<Box<dyn RunHandle>> {
        Ok(Box::new(NoopRun {
            id: uuid::Uuid::new_v4().to_string(),
        }))
    }
}

struct NoopRun {
    id: String,
}

#[async_trait]
impl RunHandle for NoopRun {
    fn id(&self) -> &str {
        &self.id
    }

    async fn log_param(&self, _key: &str, _value: &str) -> Result<()> {
        Ok(())
    }

    async fn log_metric(&self, _key: &str, _value: f64) -> Result<()> {
        Ok(())
    }

    async fn log_dict(&self, _value: &Value, _label: &str) -> Result<()> {
        Ok(())
    }

    async fn end(&self, _status: RunStatus) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_tracker_records_runs() {
        let tracker = RecordingTracker::new();

        let top = tracker.start_run("RAG_Pipeline", None).await.unwrap();
        top.log_param("query", "What is Khoury?").await.unwrap();

        let nested = tracker
            .start_run("retrieval", Some(top.id()))
            .await
            .unwrap();
        nested.log_metric("retrieval_time", 0.25).await.unwrap();
        nested.end(RunStatus::Finished).await.unwrap();

        top.end(RunStatus::Finished).await.unwrap();

        let runs = tracker.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].name, "RAG_Pipeline");
        assert_eq!(runs[0].param("query"), Some("What is Khoury?"));
        assert_eq!(runs[0].status, Some(RunStatus::Finished));

        assert_eq!(runs[1].name, "retrieval");
        assert_eq!(runs[1].parent.as_deref(), Some(runs[0].id.as_str()));
        assert_eq!(runs[1].metric("retrieval_time"), Some(0.25));
    }

    #[tokio::test]
    async fn test_recording_tracker_log_dict() {
        let tracker = RecordingTracker::new();
        let run = tracker.start_run("retrieval", None).await.unwrap();

        let value = serde_json::json!([{ "doc_id": 1, "source": "wiki" }]);
        run.log_dict(&value, "retrieved_docs.json").await.unwrap();

        let runs = tracker.runs();
        assert_eq!(runs[0].dicts.len(), 1);
        assert_eq!(runs[0].dicts[0].0, "retrieved_docs.json");
        assert_eq!(runs[0].dicts[0].1[0]["source"], "wiki");
    }

    #[tokio::test]
    async fn test_recording_tracker_clones_share_store() {
        let tracker = RecordingTracker::new();
        let observer = tracker.clone();

        let run = tracker.start_run("generation", None).await.unwrap();
        run.log_param("model_name", "mistral-large-latest")
            .await
            .unwrap();

        assert_eq!(observer.runs().len(), 1);
        assert_eq!(
            observer.runs()[0].param("model_name"),
            Some("mistral-large-latest")
        );
    }

    #[tokio::test]
    async fn test_runs_named_filter() {
        let tracker = RecordingTracker::new();
        tracker.start_run("RAG_Pipeline", None).await.unwrap();
        tracker.start_run("retrieval", None).await.unwrap();
        tracker.start_run("RAG_Pipeline", None).await.unwrap();

        assert_eq!(tracker.runs_named("RAG_Pipeline").len(), 2);
        assert_eq!(tracker.runs_named("retrieval").len(), 1);
        assert!(tracker.runs_named("generation").is_empty());
    }

    #[tokio::test]
    async fn test_noop_tracker_accepts_everything() {
        let tracker = NoopTracker::new();
        let run = tracker.start_run("anything", None).await.unwrap();

        assert!(!run.id().is_empty());
        run.log_param("k", "v").await.unwrap();
        run.log_metric("m", 1.0).await.unwrap();
        run.log_dict(&serde_json::json!({}), "d").await.unwrap();
        run.end(RunStatus::Failed).await.unwrap();
    }
}
