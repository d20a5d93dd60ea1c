//! Run tracking for NuBot.
//!
//! Records nested runs, parameters, metrics, and structured artifacts
//! for per-invocation observability. The [`RunTracker`] and [`RunHandle`]
//! traits are the seam the pipeline logs through; implementations cover
//! an MLflow tracking server, an in-memory recorder for tests, and a
//! no-op sink.

pub mod mlflow;
pub mod recording;
pub mod tracker;

pub use mlflow::{MlflowRun, MlflowTracker};
pub use recording::{NoopTracker, RecordedRun, RecordingRun, RecordingTracker};
pub use tracker::{RunHandle, RunStatus, RunTracker};
