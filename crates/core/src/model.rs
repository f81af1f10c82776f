//! Generative model trait — hosted text generation and embeddings.
//!
//! One trait per hosted backend: the same service that answers questions also
//! computes the embeddings used for retrieval, so both capabilities live on
//! one boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Sampling parameters forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.8
}
fn default_max_output_tokens() -> u32 {
    1000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// A single-prompt generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Model identifier, e.g. "gemini-1.5-flash".
    pub model: String,
    /// The fully assembled prompt (persona + context + question).
    pub prompt: String,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }
}

/// The model's answer.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    /// Model that actually served the request.
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Token accounting, when the backend reports it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// What the embedding will be used for. Retrieval-tuned models embed queries
/// and documents differently, so the task type rides with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTask {
    /// Embedding a search query.
    Query,
    /// Embedding a document chunk for storage.
    Document,
}

/// A batch embedding request.
#[derive(Debug, Clone)]
pub struct EmbeddingRequest {
    /// Embedding model identifier, e.g. "text-embedding-004".
    pub model: String,
    pub texts: Vec<String>,
    pub task: EmbeddingTask,
}

impl EmbeddingRequest {
    pub fn query(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            texts: vec![text.into()],
            task: EmbeddingTask::Query,
        }
    }

    pub fn documents(model: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            model: model.into(),
            texts,
            task: EmbeddingTask::Document,
        }
    }
}

/// One vector per input text, in input order.
#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub vectors: Vec<Vec<f32>>,
    pub model: String,
}

/// The generation model boundary.
///
/// Implementations: Gemini REST client, scripted mocks for tests.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// The backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Generate a completion for a fully assembled prompt.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GenerationError>;

    /// Embed a batch of texts for similarity search.
    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, GenerationError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_config_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 0.8);
        assert_eq!(config.max_output_tokens, 1000);
    }

    #[test]
    fn request_builder_overrides_config() {
        let config = GenerationConfig {
            temperature: 0.2,
            ..Default::default()
        };
        let req = GenerationRequest::new("gemini-1.5-flash", "Explain mitosis")
            .with_config(config);
        assert_eq!(req.config.temperature, 0.2);
        assert_eq!(req.config.top_p, 0.8);
    }

    #[test]
    fn embedding_request_constructors_set_task() {
        let q = EmbeddingRequest::query("text-embedding-004", "what is dna");
        assert_eq!(q.task, EmbeddingTask::Query);
        assert_eq!(q.texts.len(), 1);

        let d = EmbeddingRequest::documents("text-embedding-004", vec!["a".into(), "b".into()]);
        assert_eq!(d.task, EmbeddingTask::Document);
        assert_eq!(d.texts.len(), 2);
    }
}
