//! NuBot Core — shared types, errors, configuration, and LLM providers.
//!
//! This crate provides the foundational types used across all NuBot crates.
//! It has no internal NuBot dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`config`]: Configuration loading (file + env + defaults)
//! - [`cache`]: Guarded lazy initialization for process-wide resources
//! - [`prompt`]: Prompt template for retrieval QA
//! - [`llm`]: Generation backend abstraction and implementations

pub mod cache;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;

// Re-export key types at crate root for convenience
pub use cache::CachedResource;
pub use config::NubotConfig;
pub use error::{Error, Result, Stage};
pub use prompt::PromptTemplate;
