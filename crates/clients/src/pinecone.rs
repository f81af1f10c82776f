//! Pinecone client — serverless vector index access.
//!
//! Two planes are involved: the control plane (`api.pinecone.io`) describes
//! indexes and resolves the per-index data-plane host, and the data plane
//! (`https://{host}`) serves queries and upserts. [`PineconeClient::connect`]
//! resolves the host once at startup; [`PineconeClient::with_host`] skips the
//! lookup when the host is already known.

use async_trait::async_trait;
use matric_core::error::RetrievalError;
use matric_core::index::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::retry::{RetryPolicy, retry_request};

/// Upserts are chunked so a large ingest never exceeds request limits.
const UPSERT_BATCH: usize = 100;

/// A Pinecone-backed vector index.
#[derive(Debug)]
pub struct PineconeClient {
    index_name: String,
    host: String,
    control_url: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl PineconeClient {
    /// Resolve the index host via the control plane and build a client.
    pub async fn connect(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        control_url: impl Into<String>,
    ) -> Result<Self, RetrievalError> {
        let mut client = Self::with_host(api_key, index_name, "");
        client.control_url = control_url.into().trim_end_matches('/').to_string();

        let description = client.describe_via_control_plane().await?;
        if description.host.is_empty() {
            return Err(RetrievalError::ApiError {
                status_code: 200,
                message: format!(
                    "Index '{}' has no host assigned yet",
                    client.index_name
                ),
            });
        }
        client.host = normalize_host(&description.host);
        debug!(index = %client.index_name, host = %client.host, "Resolved index host");
        Ok(client)
    }

    /// Build a client against a known data-plane host, skipping the lookup.
    pub fn with_host(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            index_name: index_name.into(),
            host: normalize_host(&host.into()),
            control_url: "https://api.pinecone.io".into(),
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

    fn map_send_error(err: reqwest::Error) -> RetrievalError {
        if err.is_timeout() {
            RetrievalError::Timeout(err.to_string())
        } else {
            RetrievalError::Network(err.to_string())
        }
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, RetrievalError> {
        let status = response.status().as_u16();

        if status == 429 {
            return Err(RetrievalError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(RetrievalError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status == 404 {
            return Err(RetrievalError::IndexNotFound(self.index_name.clone()));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Pinecone returned error");
            return Err(RetrievalError::ApiError {
                status_code: status,
                message: error_body,
            });
        }
        Ok(response)
    }

    async fn describe_via_control_plane(&self) -> Result<IndexDescription, RetrievalError> {
        let url = format!("{}/indexes/{}", self.control_url, self.index_name);
        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = self.check_status(response).await?;

        response.json().await.map_err(|e| RetrievalError::ApiError {
            status_code: 200,
            message: format!("Failed to parse index description: {e}"),
        })
    }

    async fn send_query(
        &self,
        body: &ApiQueryRequest<'_>,
    ) -> Result<Vec<ScoredMatch>, RetrievalError> {
        let url = format!("{}/query", self.host);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = self.check_status(response).await?;

        let api_response: ApiQueryResponse =
            response.json().await.map_err(|e| RetrievalError::ApiError {
                status_code: 200,
                message: format!("Failed to parse query response: {e}"),
            })?;

        Ok(api_response.matches)
    }

    async fn send_upsert(
        &self,
        body: &ApiUpsertRequest<'_>,
    ) -> Result<usize, RetrievalError> {
        let url = format!("{}/vectors/upsert", self.host);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let response = self.check_status(response).await?;

        let api_response: ApiUpsertResponse =
            response.json().await.map_err(|e| RetrievalError::ApiError {
                status_code: 200,
                message: format!("Failed to parse upsert response: {e}"),
            })?;

        Ok(api_response.upserted_count)
    }
}

#[async_trait]
impl VectorIndex for PineconeClient {
    fn name(&self) -> &str {
        &self.index_name
    }

    async fn query(&self, query: IndexQuery) -> Result<Vec<ScoredMatch>, RetrievalError> {
        let body = ApiQueryRequest {
            vector: &query.vector,
            top_k: query.top_k,
            filter: query.filter.as_ref(),
            include_metadata: query.include_metadata,
        };

        debug!(
            index = %self.index_name,
            top_k = query.top_k,
            filtered = query.filter.is_some(),
            "Querying index"
        );

        retry_request("pinecone.query", self.retry, || self.send_query(&body)).await
    }

    async fn upsert(&self, records: Vec<PassageRecord>) -> Result<usize, RetrievalError> {
        let mut total = 0;
        for chunk in records.chunks(UPSERT_BATCH) {
            let body = ApiUpsertRequest { vectors: chunk };
            let count =
                retry_request("pinecone.upsert", self.retry, || self.send_upsert(&body)).await?;
            total += count;
            debug!(index = %self.index_name, upserted = count, "Upserted batch");
        }
        Ok(total)
    }

    async fn describe(&self) -> Result<IndexDescription, RetrievalError> {
        self.describe_via_control_plane().await
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.is_empty() || host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

// --- Pinecone API types (internal) ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiQueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a matric_core::tags::TagFilter>,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct ApiQueryResponse {
    #[serde(default)]
    matches: Vec<ScoredMatch>,
}

#[derive(Debug, Serialize)]
struct ApiUpsertRequest<'a> {
    vectors: &'a [PassageRecord],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use matric_core::tags::ContextTags;

    #[test]
    fn normalize_host_adds_scheme_once() {
        assert_eq!(
            normalize_host("matric-index-abc.svc.pinecone.io"),
            "https://matric-index-abc.svc.pinecone.io"
        );
        assert_eq!(
            normalize_host("https://matric-index-abc.svc.pinecone.io/"),
            "https://matric-index-abc.svc.pinecone.io"
        );
        assert_eq!(normalize_host(""), "");
    }

    #[test]
    fn query_request_serializes_camel_case_with_flat_filter() {
        let filter = ContextTags::default().filter();
        let body = ApiQueryRequest {
            vector: &[0.1, 0.2],
            top_k: 5,
            filter: Some(&filter),
            include_metadata: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["topK"], 5);
        assert_eq!(json["includeMetadata"], true);
        assert_eq!(json["filter"]["curriculum"], "caps");
        assert_eq!(json["filter"]["grade"], "grade12");
        assert!(json["filter"].get("subject").is_none());
    }

    #[test]
    fn query_request_omits_absent_filter() {
        let body = ApiQueryRequest {
            vector: &[0.5],
            top_k: 3,
            filter: None,
            include_metadata: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("filter").is_none());
    }

    #[test]
    fn parse_query_response_with_and_without_metadata() {
        let data = r#"{
            "matches": [
                {"id": "caps_grade12_life-science_notes_0", "score": 0.87,
                 "metadata": {"text": "DNA replication...", "filename": "notes.txt", "type": "study_material"}},
                {"id": "orphan", "score": 0.42}
            ],
            "namespace": ""
        }"#;
        let parsed: ApiQueryResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.matches.len(), 2);
        assert_eq!(parsed.matches[0].score, 0.87);
        assert_eq!(
            parsed.matches[0].metadata.filename.as_deref(),
            Some("notes.txt")
        );
        assert!(parsed.matches[1].metadata.text.is_none());
    }

    #[test]
    fn parse_upsert_response() {
        let data = r#"{"upsertedCount": 42}"#;
        let parsed: ApiUpsertResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.upserted_count, 42);
    }

    #[test]
    fn parse_index_description() {
        let data = r#"{
            "name": "matric-tutor",
            "dimension": 768,
            "metric": "cosine",
            "host": "matric-tutor-abc123.svc.aped-4627-b74a.pinecone.io",
            "status": {"ready": true, "state": "Ready"}
        }"#;
        let parsed: IndexDescription = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.name, "matric-tutor");
        assert_eq!(parsed.dimension, 768);
        assert!(parsed.host.ends_with("pinecone.io"));
    }
}
