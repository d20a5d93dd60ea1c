//! Similarity-search infrastructure for NuBot.
//!
//! This crate provides the retrieval side of the pipeline: document
//! types, pluggable embedding providers, an in-memory cosine-similarity
//! index, and loading of the serialized index file produced by the
//! external build process.
//!
//! # Features
//!
//! - `index-fastembed`: Enable local embedding generation via fastembed

pub mod backend;
pub mod embedding;
pub mod persistence;
pub mod types;

// Feature-gated provider module
#[cfg(feature = "index-fastembed")]
pub mod fastembed;

// Re-exports — core types
pub use types::{IndexedDocument, RetrievedDocument};

// Re-exports — traits and backends
pub use backend::{SearchBackend, VectorIndex};
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider};

// Re-exports — persistence
pub use persistence::{IndexMetadata, StoredIndex, load_stored_index, open_index, save_stored_index};

// Feature-gated re-exports
#[cfg(feature = "index-fastembed")]
pub use fastembed::FastEmbedProvider;
