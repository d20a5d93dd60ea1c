//! Run tracker abstraction.
//!
//! A [`RunTracker`] records nested runs with parameters, metrics, and
//! structured artifacts for observability. Run handles are passed
//! explicitly from the orchestrator down into the pipeline stages —
//! there is no ambient "current run", so concurrent invocations cannot
//! cross-contaminate each other's nested runs.

use async_trait::async_trait;
use nubot_core::Result;
use serde_json::Value;

/// Terminal status of a tracked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The run completed successfully.
    Finished,
    /// The run was aborted by a failure.
    Failed,
}

impl RunStatus {
    /// The status string used on the wire and in assertions.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// Abstraction over run-tracking backends.
#[async_trait]
pub trait RunTracker: Send + Sync {
    /// Open a run.
    ///
    /// `parent` nests the new run under an existing one; `None` starts a
    /// top-level run. The returned handle must be closed with
    /// [`RunHandle::end`] on every exit path.
    async fn start_run(&self, name: &str, parent: Option<&str>) -> Result<Box<dyn RunHandle>>;
}

/// A handle to an open run.
#[async_trait]
pub trait RunHandle: Send + Sync {
    /// The run's identifier, used to parent nested runs.
    fn id(&self) -> &str;

    /// Record a string parameter.
    async fn log_param(&self, key: &str, value: &str) -> Result<()>;

    /// Record a numeric metric.
    async fn log_metric(&self, key: &str, value: f64) -> Result<()>;

    /// Record a structured JSON artifact under the given label.
    async fn log_dict(&self, value: &Value, label: &str) -> Result<()>;

    /// Close the run with a terminal status.
    async fn end(&self, status: RunStatus) -> Result<()>;
}
