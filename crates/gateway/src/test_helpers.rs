//! Shared scripted doubles for gateway handler tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use matric_config::AppConfig;
use matric_core::error::{GenerationError, RetrievalError};
use matric_core::index::{
    IndexDescription, IndexQuery, PassageMetadata, PassageRecord, ScoredMatch, VectorIndex,
};
use matric_core::model::{
    EmbeddingRequest, EmbeddingResponse, GenerationRequest, GenerationResponse, GenerativeModel,
};
use matric_pipeline::TutorService;

use crate::{GatewayState, SharedState};

/// A model that replies with a fixed answer, fails, or stalls.
pub struct ScriptedModel {
    answer: String,
    fail: Option<GenerationError>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: text.to_string(),
            fail: None,
            delay: None,
        }
    }

    pub fn failing(err: GenerationError) -> Self {
        Self {
            answer: String::new(),
            fail: Some(err),
            delay: None,
        }
    }

    /// Stalls far beyond any test deadline.
    pub fn hanging() -> Self {
        Self {
            answer: "too late".to_string(),
            fail: None,
            delay: Some(Duration::from_secs(3600)),
        }
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted-model"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail {
            return Err(err.clone());
        }
        Ok(GenerationResponse {
            text: self.answer.clone(),
            model: request.model,
            usage: None,
        })
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> Result<EmbeddingResponse, GenerationError> {
        Ok(EmbeddingResponse {
            vectors: vec![vec![0.1, 0.2, 0.3]; request.texts.len()],
            model: request.model,
        })
    }
}

/// An index that returns fixed matches or a fixed error.
pub struct ScriptedIndex {
    matches: Vec<ScoredMatch>,
    fail: Option<RetrievalError>,
}

impl ScriptedIndex {
    pub fn returning(matches: Vec<ScoredMatch>) -> Self {
        Self {
            matches,
            fail: None,
        }
    }

    pub fn failing(err: RetrievalError) -> Self {
        Self {
            matches: vec![],
            fail: Some(err),
        }
    }
}

#[async_trait]
impl VectorIndex for ScriptedIndex {
    fn name(&self) -> &str {
        "scripted-index"
    }

    async fn query(&self, _query: IndexQuery) -> Result<Vec<ScoredMatch>, RetrievalError> {
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(self.matches.clone()),
        }
    }

    async fn upsert(&self, records: Vec<PassageRecord>) -> Result<usize, RetrievalError> {
        Ok(records.len())
    }

    async fn describe(&self) -> Result<IndexDescription, RetrievalError> {
        Ok(IndexDescription {
            name: "scripted-index".to_string(),
            dimension: 3,
            host: "localhost".to_string(),
        })
    }
}

pub fn passage(id: &str, score: f32, filename: &str, text: &str) -> ScoredMatch {
    ScoredMatch {
        id: id.to_string(),
        score,
        metadata: PassageMetadata {
            text: Some(text.to_string()),
            filename: Some(filename.to_string()),
            ..Default::default()
        },
    }
}

pub fn state_for(model: Arc<dyn GenerativeModel>, index: Arc<dyn VectorIndex>) -> SharedState {
    state_with_config(model, index, &AppConfig::default())
}

pub fn state_with_config(
    model: Arc<dyn GenerativeModel>,
    index: Arc<dyn VectorIndex>,
    config: &AppConfig,
) -> SharedState {
    let service = TutorService::new(model, index, config).unwrap();
    Arc::new(GatewayState::new(service, config))
}
