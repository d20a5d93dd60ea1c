//! Pipeline orchestrator.
//!
//! Wires the retrieval and generation stages into a fixed sequential
//! composition and executes it inside a top-level tracked run. A
//! two-node pipeline needs no graph engine: the orchestrator calls the
//! stages in order, enforces that generation only ever sees the context
//! retrieval produced, and wraps any stage failure in
//! `Error::Pipeline` carrying the original cause.

use std::sync::Arc;

use nubot_core::{Error, Result, Stage};
use nubot_index::SearchBackend;
use nubot_tracking::{RunHandle, RunStatus, RunTracker};
use tracing::{info, warn};

use crate::generation;
use crate::resources::PipelineResources;
use crate::retrieval;
use crate::state::PipelineState;

/// Name of the umbrella run wrapping one invocation.
const PIPELINE_RUN_NAME: &str = "RAG_Pipeline";

/// The retrieve-then-generate pipeline.
///
/// Cheap to share: holds the search backend, the run tracker, and the
/// lazily-constructed resources behind `Arc`s. Invocations are
/// independent — each gets a fresh [`PipelineState`] and its own run
/// tree — so one pipeline may serve concurrent callers.
pub struct RagPipeline {
    backend: Arc<dyn SearchBackend>,
    tracker: Arc<dyn RunTracker>,
    resources: Arc<PipelineResources>,
}

impl RagPipeline {
    /// Assemble a pipeline from its collaborators.
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        tracker: Arc<dyn RunTracker>,
        resources: Arc<PipelineResources>,
    ) -> Self {
        Self {
            backend,
            tracker,
            resources,
        }
    }

    /// Answer a question.
    ///
    /// Opens the top-level `RAG_Pipeline` run, executes retrieval then
    /// generation, and returns the answer. On success the run records
    /// the query and the final answer and is closed FINISHED. On any
    /// stage failure the stringified error is logged under `error`
    /// (best-effort — a tracking hiccup must not mask the cause), the
    /// run is closed FAILED, and the returned error is
    /// [`Error::Pipeline`] wrapping the original cause. The failure is
    /// never swallowed and no partial answer is ever returned.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let run = self.tracker.start_run(PIPELINE_RUN_NAME, None).await?;

        let outcome = self.execute(query, run.as_ref()).await;

        match outcome {
            Ok(answer) => {
                let bookkeeping = async {
                    run.log_param("final_answer", &answer).await?;
                    run.end(RunStatus::Finished).await
                }
                .await;

                if let Err(err) = bookkeeping {
                    if let Err(end_err) = run.end(RunStatus::Failed).await {
                        warn!(error = %end_err, "failed to close pipeline run");
                    }
                    return Err(err);
                }

                info!(query_len = query.len(), "pipeline finished");
                Ok(answer)
            }
            Err(err) => {
                if let Err(log_err) = run.log_param("error", &err.to_string()).await {
                    warn!(error = %log_err, "failed to log pipeline error");
                }
                if let Err(end_err) = run.end(RunStatus::Failed).await {
                    warn!(error = %end_err, "failed to close pipeline run");
                }
                Err(err)
            }
        }
    }

    /// Run the two stages in their fixed order.
    async fn execute(&self, query: &str, run: &dyn RunHandle) -> Result<String> {
        run.log_param("query", query).await?;

        let state = PipelineState::new(query);

        let state = retrieval::run_retrieval(&*self.backend, &*self.tracker, run, state)
            .await
            .map_err(|e| Error::pipeline(Stage::Retrieval, e))?;

        let state = generation::run_generation(&self.resources, &*self.tracker, run, state)
            .await
            .map_err(|e| Error::pipeline(Stage::Generation, e))?;

        match state.answer {
            Some(answer) if !answer.is_empty() => Ok(answer),
            _ => Err(Error::pipeline(
                Stage::Generation,
                Error::llm("generation backend returned an empty answer"),
            )),
        }
    }
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("resources", &self.resources)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
