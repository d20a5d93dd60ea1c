//! Generation stage: prompt assembly, completion, and instrumentation.

use std::time::Instant;

use nubot_core::Result;
use nubot_core::llm::{CompletionRequest, Message};
use nubot_tracking::{RunHandle, RunStatus, RunTracker};
use tracing::{debug, warn};

use crate::resources::PipelineResources;
use crate::state::PipelineState;

/// Separator between context passages in the rendered prompt.
const PASSAGE_SEPARATOR: &str = "\n\n";

/// Execute the generation stage.
///
/// Opens a nested `generation` run under `parent`, concatenates the
/// retrieved passages in retrieval order, logs the context size
/// diagnostics, renders the cached prompt template with question and
/// context, times the completion call, logs the answer diagnostics, and
/// returns the state with `answer` set to the model's raw reply text.
/// The nested run is closed on every exit path. An empty context renders
/// a valid prompt and still reaches the backend.
pub(crate) async fn run_generation(
    resources: &PipelineResources,
    tracker: &dyn RunTracker,
    parent: &dyn RunHandle,
    state: PipelineState,
) -> Result<PipelineState> {
    let run = tracker.start_run("generation", Some(parent.id())).await?;

    let outcome = instrumented_completion(resources, run.as_ref(), &state).await;

    match outcome {
        Ok(answer) => {
            run.end(RunStatus::Finished).await?;
            Ok(state.with_answer(answer))
        }
        Err(err) => {
            if let Err(end_err) = run.end(RunStatus::Failed).await {
                warn!(error = %end_err, "failed to close generation run");
            }
            Err(err)
        }
    }
}

async fn instrumented_completion(
    resources: &PipelineResources,
    run: &dyn RunHandle,
    state: &PipelineState,
) -> Result<String> {
    // Concatenation order must match retrieval order: it determines what
    // the model sees first.
    let docs_content = state
        .context
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(PASSAGE_SEPARATOR);

    // Whitespace-split estimate, a diagnostic rather than a billing count
    let token_count = docs_content.split_whitespace().count();
    run.log_param("retrieved_tokens", &token_count.to_string())
        .await?;
    run.log_param("context_length", &docs_content.len().to_string())
        .await?;

    let prompt = resources.prompt().await?;
    let llm = resources.llm().await?;

    let rendered = prompt.render(&state.question, &docs_content);
    let request = CompletionRequest::new(vec![Message::user(rendered)])
        .with_max_tokens(resources.config().llm.max_tokens);
    let request = match resources.config().llm.temperature {
        Some(temperature) => request.with_temperature(temperature),
        None => request,
    };

    let started = Instant::now();
    let response = llm.complete(request).await?;
    let generation_time = started.elapsed().as_secs_f64();

    debug!(
        elapsed_s = generation_time,
        output_tokens = response.tokens_used.output,
        "generation complete"
    );

    run.log_metric("generation_time", generation_time).await?;
    run.log_param(
        "response_length",
        &response.content.split_whitespace().count().to_string(),
    )
    .await?;
    run.log_param("model_name", resources.model_name()).await?;

    Ok(response.content)
}

// ============================================================================
// Tests
// ============================================================================
