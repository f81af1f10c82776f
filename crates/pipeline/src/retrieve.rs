//! Retrieval — embeds the question and queries the vector index under the
//! detected tag filter.

use std::sync::Arc;

use matric_core::Question;
use matric_core::error::RetrievalError;
use matric_core::index::{IndexQuery, ScoredMatch, VectorIndex};
use matric_core::model::{EmbeddingRequest, GenerativeModel};
use matric_core::tags::ContextTags;
use tracing::debug;

/// Issues tag-scoped similarity searches.
pub struct Retriever {
    model: Arc<dyn GenerativeModel>,
    index: Arc<dyn VectorIndex>,
    embed_model: String,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        index: Arc<dyn VectorIndex>,
        embed_model: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            model,
            index,
            embed_model: embed_model.into(),
            top_k,
        }
    }

    /// Embed the question, then run a filtered nearest-neighbor search.
    ///
    /// Zero matches is an empty vec, not an error. Embedding failure is
    /// reported as a [`RetrievalError`] so the caller's degradation policy
    /// covers the whole retrieval leg.
    pub async fn search(
        &self,
        question: &Question,
        tags: &ContextTags,
    ) -> Result<Vec<ScoredMatch>, RetrievalError> {
        let request = EmbeddingRequest::query(&self.embed_model, question.as_str());
        let response = self
            .model
            .embed(request)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;
        let vector = response
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("embedding response was empty".into()))?;

        debug!(
            dimension = vector.len(),
            top_k = self.top_k,
            tags = %tags,
            "Retrieval: querying index"
        );

        let query = IndexQuery::new(vector, self.top_k).with_filter(tags.filter());
        let matches = self.index.query(query).await?;

        debug!(matches = matches.len(), "Retrieval: candidates returned");
        Ok(matches)
    }
}
