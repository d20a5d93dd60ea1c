//! Common types for the similarity index.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One similarity-search hit.
///
/// Produced by the search backend and copied into the pipeline state;
/// read-only afterward. Metadata values are JSON so numeric ids and
/// string source labels coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Passage text.
    pub content: String,

    /// Arbitrary metadata, notably an `id` and a `source` label.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl RetrievedDocument {
    /// Create a document with empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The document id, falling back to the given positional index when
    /// the `id` key is absent.
    pub fn doc_id(&self, position: usize) -> Value {
        self.metadata
            .get("id")
            .cloned()
            .unwrap_or_else(|| Value::from(position))
    }

    /// The source label, falling back to `"unknown"` when absent or not
    /// a string.
    pub fn source(&self) -> String {
        self.metadata
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string()
    }
}

/// A document stored in the index: passage, metadata, and its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    /// Passage text.
    pub content: String,

    /// Metadata carried through to search results.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,

    /// The embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexedDocument {
    /// Create an indexed document.
    pub fn new(content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            content: content.into(),
            metadata: HashMap::new(),
            embedding,
        }
    }

    /// Add a metadata key-value pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The embedding dimension.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}

impl From<&IndexedDocument> for RetrievedDocument {
    fn from(doc: &IndexedDocument) -> Self {
        Self {
            content: doc.content.clone(),
            metadata: doc.metadata.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieved_document_builder() {
        let doc = RetrievedDocument::new("Khoury is a college.")
            .with_metadata("id", 1)
            .with_metadata("source", "wiki");

        assert_eq!(doc.content, "Khoury is a college.");
        assert_eq!(doc.metadata.get("id").unwrap(), &Value::from(1));
        assert_eq!(doc.source(), "wiki");
    }

    #[test]
    fn test_doc_id_falls_back_to_position() {
        let doc = RetrievedDocument::new("no id here");
        assert_eq!(doc.doc_id(3), Value::from(3));

        let doc = RetrievedDocument::new("has id").with_metadata("id", "doc-7");
        assert_eq!(doc.doc_id(3), Value::from("doc-7"));
    }

    #[test]
    fn test_source_falls_back_to_unknown() {
        let doc = RetrievedDocument::new("anonymous");
        assert_eq!(doc.source(), "unknown");

        // Non-string source value also falls back
        let doc = RetrievedDocument::new("numeric source").with_metadata("source", 12);
        assert_eq!(doc.source(), "unknown");
    }

    #[test]
    fn test_retrieved_document_serialization_skips_empty_metadata() {
        let doc = RetrievedDocument::new("text");
        let json = serde_json::to_string(&doc).unwrap();
        assert!(!json.contains("metadata"));

        let deserialized: RetrievedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, doc);
    }

    #[test]
    fn test_indexed_document_dimension() {
        let doc = IndexedDocument::new("text", vec![0.1, 0.2, 0.3]);
        assert_eq!(doc.dimension(), 3);
    }

    #[test]
    fn test_indexed_to_retrieved_conversion() {
        let indexed = IndexedDocument::new("passage", vec![0.5; 4]).with_metadata("source", "wiki");
        let retrieved = RetrievedDocument::from(&indexed);

        assert_eq!(retrieved.content, "passage");
        assert_eq!(retrieved.source(), "wiki");
    }
}
