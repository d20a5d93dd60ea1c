//! Retrieve-then-generate pipeline for NuBot.
//!
//! A question flows through a fixed two-stage sequence: the retrieval
//! stage queries the similarity-search backend and attaches the hits as
//! context, the generation stage renders the prompt template with
//! question and context and invokes the generation backend. Each stage
//! is instrumented with a nested tracked run; the orchestrator wraps
//! the whole invocation in a top-level run and converts any stage
//! failure into a typed, cause-carrying error.
//!
//! # Modules
//!
//! - [`state`]: The per-invocation pipeline state
//! - [`resources`]: Lazily-constructed shared handles (model, prompt, embeddings)
//! - [`orchestrator`]: The [`RagPipeline`] entry point

pub mod orchestrator;
pub mod resources;
pub mod state;

mod generation;
mod retrieval;

pub use orchestrator::RagPipeline;
pub use resources::PipelineResources;
pub use state::PipelineState;
