//! Error types for NuBot operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all NuBot crates. Uses `thiserror` for derive macros.

use std::path::PathBuf;

use thiserror::Error;

/// The pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Similarity search against the document index.
    Retrieval,
    /// Answer synthesis via the generation backend.
    Generation,
}

impl Stage {
    /// The stage name as used for run labels and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Retrieval => "retrieval",
            Stage::Generation => "generation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in NuBot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The serialized similarity index does not exist on disk.
    #[error("Similarity index not found at {path}")]
    IndexMissing {
        /// Configured index location.
        path: PathBuf,
    },

    /// The serialized similarity index exists but cannot be used.
    #[error("Similarity index at {path} is corrupt: {reason}")]
    IndexCorrupt {
        /// Configured index location.
        path: PathBuf,
        /// What made the index unusable.
        reason: String,
    },

    /// Similarity-search backend failure.
    #[error("Search error: {0}")]
    Search(String),

    /// Generation backend failure.
    #[error("LLM error: {message}")]
    Llm {
        /// Description of the failure.
        message: String,
        /// Underlying transport or parse error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Run tracker failure.
    #[error("Tracking error: {0}")]
    Tracking(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Uniform wrapper for any failure inside a pipeline stage.
    ///
    /// Always carries the original cause; produced only by the
    /// orchestrator, never by the stages themselves.
    #[error("Pipeline failed in {stage} stage")]
    Pipeline {
        /// Which stage failed.
        stage: Stage,
        /// The original cause.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a search backend error.
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create an LLM error.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm {
            message: msg.into(),
            source: None,
        }
    }

    /// Create an LLM error with an underlying cause.
    pub fn llm_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Llm {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a tracking error.
    pub fn tracking(msg: impl Into<String>) -> Self {
        Self::Tracking(msg.into())
    }

    /// Wrap a stage failure for propagation out of the orchestrator.
    pub fn pipeline(stage: Stage, source: Error) -> Self {
        Self::Pipeline {
            stage,
            source: Box::new(source),
        }
    }

    /// Whether a retry wrapper should re-attempt the failed operation.
    ///
    /// Only backend-call failures are worth retrying; configuration and
    /// index problems will not resolve on their own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Llm { .. } | Error::Search(_) | Error::Tracking(_))
    }

    /// The stage a wrapped pipeline failure occurred in, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Pipeline { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Result type alias using NuBot's Error type.
pub type Result<T> = std::result::Result<T, Error>;
