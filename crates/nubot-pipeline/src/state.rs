//! Pipeline state threaded through the two stages.

use nubot_index::RetrievedDocument;

/// The mutable record one `answer()` invocation threads through the
/// retrieve → generate sequence.
///
/// Created fresh per invocation and dropped when it returns; never
/// persisted and never shared across invocations.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    /// The caller's question. Set once at pipeline start.
    pub question: String,

    /// Retrieved context, in retrieval order. Empty is valid.
    pub context: Vec<RetrievedDocument>,

    /// The synthesized answer. None until generation completes.
    pub answer: Option<String>,
}

impl PipelineState {
    /// Start a fresh state for a question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            context: Vec::new(),
            answer: None,
        }
    }

    /// State with retrieval output attached.
    pub fn with_context(mut self, context: Vec<RetrievedDocument>) -> Self {
        self.context = context;
        self
    }

    /// State with the generated answer attached.
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }
}
