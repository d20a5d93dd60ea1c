//! Similarity-search backend.
//!
//! The [`SearchBackend`] trait is the seam the retrieval stage calls
//! through: a query string in, an ordered sequence of hits out. The
//! provided [`VectorIndex`] implementation embeds the query and ranks
//! the preloaded documents by cosine similarity.

use std::sync::Arc;

use async_trait::async_trait;
use nubot_core::{Error, Result};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::types::{IndexedDocument, RetrievedDocument};

/// Abstraction over similarity-search backends.
///
/// Results are ordered most-similar first. Query rewriting, filtering,
/// and re-ranking are the backend's responsibility; callers pass the
/// question through verbatim.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Find the documents most similar to `query`.
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>>;
}

/// In-memory vector index over embedded documents.
///
/// Holds the deserialized index in memory and answers nearest-neighbor
/// queries by embedding the query and scoring every document with cosine
/// similarity. Index sizes here are small enough that a linear scan
/// outperforms maintaining an ANN structure.
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    documents: Vec<IndexedDocument>,
    top_k: usize,
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("embedder", &self.embedder.name())
            .field("documents", &self.documents)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl VectorIndex {
    /// Create an empty index.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            embedder,
            documents: Vec::new(),
            top_k,
        }
    }

    /// Create an index over pre-embedded documents.
    ///
    /// Fails with an invalid-dimension error if any document's embedding
    /// does not match the provider's dimension.
    pub fn with_documents(
        embedder: Arc<dyn EmbeddingProvider>,
        documents: Vec<IndexedDocument>,
        top_k: usize,
    ) -> Result<Self> {
        let expected = embedder.dimension();
        for (i, doc) in documents.iter().enumerate() {
            if doc.dimension() != expected {
                return Err(Error::search(format!(
                    "document {i} has embedding dimension {} but the '{}' provider produces {expected}",
                    doc.dimension(),
                    embedder.name(),
                )));
            }
        }
        Ok(Self {
            embedder,
            documents,
            top_k,
        })
    }

    /// Embed and insert a document.
    pub async fn insert(&mut self, document: RetrievedDocument) -> Result<()> {
        let embedding = self.embedder.embed(&document.content).await?;
        self.documents.push(IndexedDocument {
            content: document.content,
            metadata: document.metadata,
            embedding,
        });
        Ok(())
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the index holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The configured result count.
    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl SearchBackend for VectorIndex {
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let query_embedding = self.embedder.embed(query).await?;

        let mut scored: Vec<(f32, &IndexedDocument)> = self
            .documents
            .iter()
            .map(|doc| (cosine_similarity(&query_embedding, &doc.embedding), doc))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        debug!(
            query_len = query.len(),
            candidates = self.documents.len(),
            returned = scored.len(),
            "similarity search complete"
        );

        Ok(scored
            .into_iter()
            .map(|(_, doc)| RetrievedDocument::from(doc))
            .collect())
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched lengths or zero-norm inputs.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;

    fn mock_index(top_k: usize) -> VectorIndex {
        VectorIndex::new(Arc::new(MockEmbeddingProvider::new(16)), top_k)
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let v = vec![0.5, 0.5, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_insert_and_search() {
        let mut index = mock_index(4);
        index
            .insert(RetrievedDocument::new("Khoury is a college.").with_metadata("source", "wiki"))
            .await
            .unwrap();
        index
            .insert(RetrievedDocument::new("Entirely different passage."))
            .await
            .unwrap();

        assert_eq!(index.len(), 2);

        let results = index.search("Khoury is a college.").await.unwrap();
        assert_eq!(results.len(), 2);
        // The identical passage ranks first
        assert_eq!(results[0].content, "Khoury is a college.");
        assert_eq!(results[0].source(), "wiki");
    }

    #[tokio::test]
    async fn test_search_truncates_to_top_k() {
        let mut index = mock_index(2);
        for i in 0..5 {
            index
                .insert(RetrievedDocument::new(format!("passage number {i}")))
                .await
                .unwrap();
        }

        let results = index.search("passage").await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_empty_index_returns_empty() {
        let index = mock_index(4);
        let results = index.search("anything").await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_with_documents_dimension_mismatch() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(16));
        let docs = vec![IndexedDocument::new("bad", vec![0.1; 8])];

        let err = VectorIndex::with_documents(embedder, docs, 4).unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[test]
    fn test_with_documents_accepts_matching_dimension() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(MockEmbeddingProvider::new(8));
        let docs = vec![IndexedDocument::new("ok", vec![0.1; 8])];

        let index = VectorIndex::with_documents(embedder, docs, 4).unwrap();
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }
}
