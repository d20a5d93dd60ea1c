//! Retrieval stage: similarity search plus instrumentation.

use std::time::Instant;

use nubot_core::Result;
use nubot_index::{RetrievedDocument, SearchBackend};
use nubot_tracking::{RunHandle, RunStatus, RunTracker};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::state::PipelineState;

/// Metadata-only projection of one hit, logged to the tracking sink.
///
/// Full passage content is never sent to the tracker; only the id and
/// source label leave the process.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DocumentRef {
    doc_id: Value,
    source: String,
}

impl DocumentRef {
    fn project(doc: &RetrievedDocument, position: usize) -> Self {
        Self {
            doc_id: doc.doc_id(position),
            source: doc.source(),
        }
    }
}

/// Execute the retrieval stage.
///
/// Opens a nested `retrieval` run under `parent`, queries the search
/// backend with the question, records the elapsed search time and hit
/// count, logs the metadata projection of the hits, and returns the
/// state with `context` set to the full retrieved sequence. The nested
/// run is closed on every exit path; on failure no partial context is
/// set and the error propagates unwrapped.
pub(crate) async fn run_retrieval(
    backend: &dyn SearchBackend,
    tracker: &dyn RunTracker,
    parent: &dyn RunHandle,
    state: PipelineState,
) -> Result<PipelineState> {
    let run = tracker.start_run("retrieval", Some(parent.id())).await?;

    let outcome = instrumented_search(backend, run.as_ref(), &state.question).await;

    match outcome {
        Ok(documents) => {
            run.end(RunStatus::Finished).await?;
            Ok(state.with_context(documents))
        }
        Err(err) => {
            if let Err(end_err) = run.end(RunStatus::Failed).await {
                warn!(error = %end_err, "failed to close retrieval run");
            }
            Err(err)
        }
    }
}

async fn instrumented_search(
    backend: &dyn SearchBackend,
    run: &dyn RunHandle,
    question: &str,
) -> Result<Vec<RetrievedDocument>> {
    let started = Instant::now();
    let documents = backend.search(question).await?;
    let retrieval_time = started.elapsed().as_secs_f64();

    debug!(
        count = documents.len(),
        elapsed_s = retrieval_time,
        "retrieval complete"
    );

    run.log_metric("retrieval_time", retrieval_time).await?;
    run.log_param("retrieved_docs_count", &documents.len().to_string())
        .await?;

    let refs: Vec<DocumentRef> = documents
        .iter()
        .enumerate()
        .map(|(i, doc)| DocumentRef::project(doc, i))
        .collect();
    run.log_dict(&serde_json::to_value(&refs)?, "retrieved_docs.json")
        .await?;

    Ok(documents)
}

// ============================================================================
// Tests
// ============================================================================
