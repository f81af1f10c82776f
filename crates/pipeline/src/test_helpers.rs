//! Shared test helpers for pipeline tests.

use std::sync::Mutex;

use matric_core::error::{GenerationError, RetrievalError};
use matric_core::index::{
    IndexDescription, IndexQuery, PassageMetadata, PassageRecord, ScoredMatch, VectorIndex,
};
use matric_core::model::{
    EmbeddingRequest, EmbeddingResponse, GenerationRequest, GenerationResponse, GenerativeModel,
};

/// A scripted model: fixed embedding vector, fixed answer, call counters.
///
/// Either leg can be made to fail independently, so tests can exercise the
/// degradation path (embedding down, generation up) and the fatal path
/// (generation down).
pub struct MockModel {
    pub answer: String,
    pub embed_vector: Vec<f32>,
    fail_generation: Option<GenerationError>,
    fail_embedding: Option<GenerationError>,
    generate_calls: Mutex<usize>,
    embed_calls: Mutex<usize>,
    last_prompt: Mutex<Option<String>>,
}

impl MockModel {
    pub fn answering(text: &str) -> Self {
        Self {
            answer: text.into(),
            embed_vector: vec![0.1, 0.2, 0.3],
            fail_generation: None,
            fail_embedding: None,
            generate_calls: Mutex::new(0),
            embed_calls: Mutex::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn failing_generation(err: GenerationError) -> Self {
        let mut mock = Self::answering("");
        mock.fail_generation = Some(err);
        mock
    }

    pub fn failing_embedding(err: GenerationError) -> Self {
        let mut mock = Self::answering("degraded answer");
        mock.fail_embedding = Some(err);
        mock
    }

    pub fn generate_calls(&self) -> usize {
        *self.generate_calls.lock().unwrap()
    }

    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock().unwrap()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GenerativeModel for MockModel {
    fn name(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        *self.generate_calls.lock().unwrap() += 1;
        *self.last_prompt.lock().unwrap() = Some(request.prompt.clone());

        if let Some(err) = &self.fail_generation {
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
        *self.embed_calls.lock().unwrap() += 1;

        if let Some(err) = &self.fail_embedding {
            return Err(err.clone());
        }
        Ok(EmbeddingResponse {
            vectors: vec![self.embed_vector.clone(); request.texts.len()],
            model: request.model,
        })
    }
}

/// A scripted index: fixed matches or a scripted failure, recorded queries.
pub struct MockIndex {
    matches: Vec<ScoredMatch>,
    fail: Option<RetrievalError>,
    query_calls: Mutex<usize>,
    last_query: Mutex<Option<IndexQuery>>,
}

impl MockIndex {
    pub fn returning(matches: Vec<ScoredMatch>) -> Self {
        Self {
            matches,
            fail: None,
            query_calls: Mutex::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn failing(err: RetrievalError) -> Self {
        let mut mock = Self::returning(vec![]);
        mock.fail = Some(err);
        mock
    }

    pub fn query_calls(&self) -> usize {
        *self.query_calls.lock().unwrap()
    }

    pub fn last_query(&self) -> Option<IndexQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VectorIndex for MockIndex {
    fn name(&self) -> &str {
        "mock-index"
    }

    async fn query(&self, query: IndexQuery) -> Result<Vec<ScoredMatch>, RetrievalError> {
        *self.query_calls.lock().unwrap() += 1;
        *self.last_query.lock().unwrap() = Some(query);

        if let Some(err) = &self.fail {
            return Err(err.clone());
        }
        Ok(self.matches.clone())
    }

    async fn upsert(&self, records: Vec<PassageRecord>) -> Result<usize, RetrievalError> {
        Ok(records.len())
    }

    async fn describe(&self) -> Result<IndexDescription, RetrievalError> {
        Ok(IndexDescription {
            name: "mock-index".into(),
            dimension: 768,
            host: "localhost".into(),
        })
    }
}

/// A match fixture carrying a filename and text body.
pub fn scored(id: &str, score: f32, filename: &str, text: &str) -> ScoredMatch {
    ScoredMatch {
        id: id.into(),
        score,
        metadata: PassageMetadata {
            text: Some(text.into()),
            filename: Some(filename.into()),
            ..Default::default()
        },
    }
}
