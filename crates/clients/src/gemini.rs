//! Gemini client — hosted text generation and embeddings.
//!
//! Speaks the `generativelanguage.googleapis.com` v1beta REST API:
//! - `models/{model}:generateContent` for completions
//! - `models/{model}:batchEmbedContents` for embeddings
//!
//! Authentication uses the `x-goog-api-key` header rather than a query
//! parameter, so request URLs in logs and error text never carry the key.

use async_trait::async_trait;
use matric_core::error::GenerationError;
use matric_core::model::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::retry::{RetryPolicy, retry_request};

/// A Gemini-backed generative model.
#[derive(Debug)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Create a new client against the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://generativelanguage.googleapis.com")
    }

    /// Create a client against a specific endpoint (proxies, tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// `models/{model}:{op}` URL with the bare model name in the path.
    fn op_url(&self, model: &str, op: &str) -> String {
        let bare = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:{}", self.base_url, bare, op)
    }

    /// Fully qualified model name as the embed API wants it in the body.
    fn qualified_model(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        }
    }

    fn map_send_error(err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(err.to_string())
        } else {
            GenerationError::Network(err.to_string())
        }
    }

    async fn check_status(
        response: reqwest::Response,
        model: &str,
    ) -> Result<reqwest::Response, GenerationError> {
        let status = response.status().as_u16();

        if status == 429 {
            return Err(GenerationError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(GenerationError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status == 404 {
            return Err(GenerationError::ModelNotFound(model.to_string()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }
        Ok(response)
    }

    async fn send_generate(
        &self,
        url: &str,
        model: &str,
        body: &ApiGenerateRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = Self::check_status(response, model).await?;

        let api_response: ApiGenerateResponse =
            response.json().await.map_err(|e| GenerationError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let text = api_response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = api_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .or_else(|| {
                    api_response
                        .candidates
                        .first()
                        .and_then(|c| c.finish_reason.clone())
                })
                .unwrap_or_else(|| "no candidates in response".into());
            return Err(GenerationError::EmptyResponse(reason));
        }

        let usage = api_response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(GenerationResponse {
            text,
            model: api_response
                .model_version
                .unwrap_or_else(|| model.to_string()),
            usage,
        })
    }

    async fn send_embed(
        &self,
        url: &str,
        model: &str,
        body: &ApiBatchEmbedRequest,
        expected: usize,
    ) -> Result<EmbeddingResponse, GenerationError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = Self::check_status(response, model).await?;

        let api_response: ApiBatchEmbedResponse =
            response.json().await.map_err(|e| GenerationError::ApiError {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        if api_response.embeddings.len() != expected {
            return Err(GenerationError::ApiError {
                status_code: 200,
                message: format!(
                    "Expected {expected} embeddings, got {}",
                    api_response.embeddings.len()
                ),
            });
        }

        Ok(EmbeddingResponse {
            vectors: api_response
                .embeddings
                .into_iter()
                .map(|e| e.values)
                .collect(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<GenerationResponse, GenerationError> {
        let url = self.op_url(&request.model, "generateContent");
        let body = ApiGenerateRequest {
            contents: vec![ApiContent {
                role: Some("user".into()),
                parts: vec![ApiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: ApiGenerationConfig {
                temperature: request.config.temperature,
                top_p: request.config.top_p,
                max_output_tokens: request.config.max_output_tokens,
            },
        };

        debug!(
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "Sending generation request"
        );

        retry_request("gemini.generateContent", self.retry, || {
            self.send_generate(&url, &request.model, &body)
        })
        .await
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, GenerationError> {
        let url = self.op_url(&request.model, "batchEmbedContents");
        let task_type = match request.task {
            EmbeddingTask::Query => "RETRIEVAL_QUERY",
            EmbeddingTask::Document => "RETRIEVAL_DOCUMENT",
        };
        let body = ApiBatchEmbedRequest {
            requests: request
                .texts
                .iter()
                .map(|text| ApiEmbedRequest {
                    model: Self::qualified_model(&request.model),
                    content: ApiContent {
                        role: None,
                        parts: vec![ApiPart { text: text.clone() }],
                    },
                    task_type: task_type.into(),
                })
                .collect(),
        };

        debug!(
            model = %request.model,
            count = request.texts.len(),
            task = task_type,
            "Sending embedding request"
        );

        retry_request("gemini.batchEmbedContents", self.retry, || {
            self.send_embed(&url, &request.model, &body, request.texts.len())
        })
        .await
    }

    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        let url = format!("{}/v1beta/models?pageSize=1", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        Ok(response.status().is_success())
    }
}

// --- Gemini API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateRequest {
    contents: Vec<ApiContent>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<ApiUsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

// --- Embedding API types ---

#[derive(Debug, Serialize)]
struct ApiBatchEmbedRequest {
    requests: Vec<ApiEmbedRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEmbedRequest {
    model: String,
    content: ApiContent,
    task_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiBatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ApiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ApiEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_url_strips_models_prefix() {
        let client = GeminiClient::new("test-key");
        assert_eq!(
            client.op_url("gemini-1.5-flash", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            client.op_url("models/text-embedding-004", "batchEmbedContents"),
            "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:batchEmbedContents"
        );
    }

    #[test]
    fn qualified_model_is_idempotent() {
        assert_eq!(
            GeminiClient::qualified_model("text-embedding-004"),
            "models/text-embedding-004"
        );
        assert_eq!(
            GeminiClient::qualified_model("models/text-embedding-004"),
            "models/text-embedding-004"
        );
    }

    #[test]
    fn generate_request_serializes_camel_case() {
        let body = ApiGenerateRequest {
            contents: vec![ApiContent {
                role: Some("user".into()),
                parts: vec![ApiPart {
                    text: "What is DNA?".into(),
                }],
            }],
            generation_config: ApiGenerationConfig {
                temperature: 0.7,
                top_p: 0.8,
                max_output_tokens: 1000,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["topP"], 0.8);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1000);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "What is DNA?");
    }

    #[test]
    fn parse_generate_response() {
        let data = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "DNA is "}, {"text": "the genetic material."}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 8, "totalTokenCount": 20},
            "modelVersion": "gemini-1.5-flash-002"
        }"#;
        let parsed: ApiGenerateResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        let parts = &parsed.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts.len(), 2);
        assert_eq!(parsed.usage_metadata.unwrap().total_token_count, 20);
        assert_eq!(parsed.model_version.as_deref(), Some("gemini-1.5-flash-002"));
    }

    #[test]
    fn parse_blocked_response() {
        let data = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: ApiGenerateResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.candidates.is_empty());
        assert_eq!(
            parsed.prompt_feedback.unwrap().block_reason.as_deref(),
            Some("SAFETY")
        );
    }

    #[test]
    fn embed_request_serializes_task_type() {
        let body = ApiBatchEmbedRequest {
            requests: vec![ApiEmbedRequest {
                model: "models/text-embedding-004".into(),
                content: ApiContent {
                    role: None,
                    parts: vec![ApiPart {
                        text: "what is osmosis".into(),
                    }],
                },
                task_type: "RETRIEVAL_QUERY".into(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["requests"][0]["taskType"], "RETRIEVAL_QUERY");
        assert_eq!(json["requests"][0]["model"], "models/text-embedding-004");
        assert!(json["requests"][0]["content"].get("role").is_none());
    }

    #[test]
    fn parse_batch_embed_response() {
        let data = r#"{"embeddings": [{"values": [0.1, 0.2]}, {"values": [0.3, 0.4]}]}"#;
        let parsed: ApiBatchEmbedResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert_eq!(parsed.embeddings[1].values, vec![0.3, 0.4]);
    }
}
