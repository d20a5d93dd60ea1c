//! Loading and saving the serialized similarity index.
//!
//! The index is built externally and synced to local storage before this
//! process starts; loading it is a startup precondition. A missing file
//! maps to `Error::IndexMissing`, an unparseable file or a dimension
//! mismatch against the configured embedder to `Error::IndexCorrupt` —
//! both fatal before any query can be served.

use std::path::Path;
use std::sync::Arc;

use nubot_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::VectorIndex;
use crate::embedding::EmbeddingProvider;
use crate::types::IndexedDocument;

/// Metadata stored alongside the indexed documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Number of documents indexed.
    pub document_count: usize,

    /// Embedding dimension.
    pub embedding_dimension: usize,

    /// Model name used for embeddings.
    pub model: String,

    /// Build timestamp (ISO 8601).
    pub built_at: String,
}

/// The on-disk form of the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIndex {
    /// Index build metadata.
    pub metadata: IndexMetadata,

    /// The embedded documents.
    pub documents: Vec<IndexedDocument>,
}

impl StoredIndex {
    /// Assemble a stored index from embedded documents.
    pub fn new(documents: Vec<IndexedDocument>, model: impl Into<String>) -> Self {
        let embedding_dimension = documents.first().map(|d| d.dimension()).unwrap_or(0);
        Self {
            metadata: IndexMetadata {
                document_count: documents.len(),
                embedding_dimension,
                model: model.into(),
                built_at: chrono::Utc::now().to_rfc3339(),
            },
            documents,
        }
    }
}

/// Load a stored index from a JSON file.
pub fn load_stored_index(path: &Path) -> Result<StoredIndex> {
    if !path.exists() {
        return Err(Error::IndexMissing {
            path: path.to_path_buf(),
        });
    }

    let json = std::fs::read_to_string(path)?;
    let stored: StoredIndex = serde_json::from_str(&json).map_err(|e| Error::IndexCorrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if stored.metadata.document_count != stored.documents.len() {
        return Err(Error::IndexCorrupt {
            path: path.to_path_buf(),
            reason: format!(
                "metadata declares {} documents but {} are present",
                stored.metadata.document_count,
                stored.documents.len()
            ),
        });
    }

    Ok(stored)
}

/// Save a stored index to a JSON file.
pub fn save_stored_index(path: &Path, index: &StoredIndex) -> Result<()> {
    let json = serde_json::to_string(index)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load the serialized index and wrap it in a queryable [`VectorIndex`].
///
/// Validates that the stored embeddings match the provider's dimension;
/// a mismatch means the index was built with a different model and is
/// unusable with this configuration.
pub fn open_index(
    path: &Path,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
) -> Result<VectorIndex> {
    let stored = load_stored_index(path)?;

    if !stored.documents.is_empty() && stored.metadata.embedding_dimension != embedder.dimension() {
        return Err(Error::IndexCorrupt {
            path: path.to_path_buf(),
            reason: format!(
                "index embeddings have dimension {} but the '{}' provider produces {}",
                stored.metadata.embedding_dimension,
                embedder.name(),
                embedder.dimension()
            ),
        });
    }

    info!(
        documents = stored.documents.len(),
        dimension = stored.metadata.embedding_dimension,
        model = %stored.metadata.model,
        "similarity index loaded"
    );

    VectorIndex::with_documents(embedder, stored.documents, top_k)
}

// ============================================================================
// Tests
// ============================================================================
