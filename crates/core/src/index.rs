//! Vector index trait — nearest-neighbor search over curriculum passages.
//!
//! The index is an external hosted service. This trait covers the two data
//! operations the service needs (query for retrieval, upsert for ingestion)
//! plus a describe call used for startup checks and diagnostics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;
use crate::tags::{ContextTags, TagFilter};

/// Metadata attached to an indexed passage.
///
/// All fields are optional on read: records written by older upload scripts
/// carried different subsets, and retrieval must tolerate any of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl PassageMetadata {
    /// Metadata for a freshly ingested study-material chunk.
    pub fn study_material(text: impl Into<String>, tags: &ContextTags, filename: &str) -> Self {
        Self {
            text: Some(text.into()),
            content: None,
            filename: Some(filename.to_string()),
            source: Some(filename.to_string()),
            curriculum: Some(tags.curriculum.to_string()),
            grade: Some(tags.grade.to_string()),
            subject: Some(tags.subject.to_string()),
            kind: Some("study_material".to_string()),
        }
    }
}

/// A scored nearest-neighbor match returned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub id: String,
    /// Similarity score in [0, 1], higher is closer.
    pub score: f32,
    #[serde(default)]
    pub metadata: PassageMetadata,
}

/// A record to upsert during ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: PassageMetadata,
}

/// A similarity query against the index.
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub filter: Option<TagFilter>,
    pub include_metadata: bool,
}

impl IndexQuery {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            filter: None,
            include_metadata: true,
        }
    }

    /// Constrain the search; an all-empty filter is dropped rather than sent.
    pub fn with_filter(mut self, filter: TagFilter) -> Self {
        self.filter = (!filter.is_empty()).then_some(filter);
        self
    }
}

/// Shape of the index as reported by the hosting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: usize,
    pub host: String,
}

/// The vector index boundary.
///
/// Implementations: Pinecone REST client, in-memory mocks for tests.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The index name (for logs and diagnostics).
    fn name(&self) -> &str;

    /// Nearest-neighbor search. Zero matches is an empty vec, not an error.
    async fn query(&self, query: IndexQuery)
    -> std::result::Result<Vec<ScoredMatch>, RetrievalError>;

    /// Insert or overwrite records. Returns the number of records accepted.
    async fn upsert(
        &self,
        records: Vec<PassageRecord>,
    ) -> std::result::Result<usize, RetrievalError>;

    /// Describe the index (dimension, host).
    async fn describe(&self) -> std::result::Result<IndexDescription, RetrievalError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> std::result::Result<bool, RetrievalError> {
        Ok(self.describe().await.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_kind_serializes_as_type() {
        let meta = PassageMetadata::study_material(
            "Photosynthesis converts light energy.",
            &ContextTags::default(),
            "photosynthesis.txt",
        );
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "study_material");
        assert_eq!(json["filename"], "photosynthesis.txt");
        assert_eq!(json["curriculum"], "caps");
        assert_eq!(json["grade"], "grade12");
        assert_eq!(json["subject"], "");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn scored_match_tolerates_missing_metadata() {
        let m: ScoredMatch =
            serde_json::from_str(r#"{"id": "caps_1", "score": 0.83}"#).unwrap();
        assert_eq!(m.id, "caps_1");
        assert_eq!(m.metadata, PassageMetadata::default());
    }

    #[test]
    fn query_drops_empty_filter() {
        let q = IndexQuery::new(vec![0.1, 0.2], 5).with_filter(TagFilter::default());
        assert!(q.filter.is_none());
        assert!(q.include_metadata);

        let q = IndexQuery::new(vec![0.1], 3).with_filter(ContextTags::default().filter());
        assert!(q.filter.is_some());
    }
}
