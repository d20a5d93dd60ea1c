//! Prompt template for question answering over retrieved context.
//!
//! A [`PromptTemplate`] is a parameterized text blueprint combining a
//! question and a context string into the exact text sent to the
//! generation backend. The template is fetched once per process and
//! cached (see `nubot-core::cache`).

use crate::error::{Error, Result};

/// Placeholder for the user's question.
const QUESTION_SLOT: &str = "{question}";

/// Placeholder for the concatenated retrieved context.
const CONTEXT_SLOT: &str = "{context}";

/// The standard question-answering prompt used when no custom template
/// is supplied.
const DEFAULT_TEMPLATE: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\
Question: {question} \n\
Context: {context} \n\
Answer:";

/// A parameterized prompt with `{question}` and `{context}` slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template from custom text.
    ///
    /// The text must contain both the `{question}` and `{context}`
    /// placeholders.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [QUESTION_SLOT, CONTEXT_SLOT] {
            if !template.contains(slot) {
                return Err(Error::config(format!(
                    "prompt template is missing the {slot} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The built-in retrieval-QA template.
    pub fn rag_default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }

    /// Render the template into model-ready text.
    ///
    /// An empty context string is valid and renders a well-formed prompt.
    pub fn render(&self, question: &str, context: &str) -> String {
        self.template
            .replace(QUESTION_SLOT, question)
            .replace(CONTEXT_SLOT, context)
    }
}

// ============================================================================
// Tests
// ============================================================================
