//! The chat endpoint: request/response DTOs and handlers.
//!
//! Response field casing is camelCase throughout because that is what the
//! web client consumes. Failure bodies keep user-facing text apologetic and
//! generic; diagnostic detail rides in an optional `debug` block that is
//! only attached when the operator enables it, and even then credential
//! values never appear, only presence booleans.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, Utc};
use matric_config::CredentialStatus;
use matric_core::Error;
use matric_core::tags::ContextTags;
use matric_pipeline::Reply;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{GatewayState, SharedState};

const SUPPORTED_METHODS: [&str; 3] = ["GET", "POST", "OPTIONS"];

/// Incoming chat request body.
///
/// `message` defaults to empty so a missing field reports the same
/// validation error as an empty one instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct ChatSuccess {
    response: String,
    success: bool,
    metadata: ChatMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatMetadata {
    version: &'static str,
    timestamp: DateTime<Utc>,
    query: String,
    context: ContextTags,
    sources_used: Vec<String>,
    results_found: usize,
    relevant_results: usize,
    has_relevant_content: bool,
    degraded: bool,
    response_length: usize,
}

#[derive(Serialize)]
struct ChatFailure {
    success: bool,
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<DebugInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugInfo {
    error_type: String,
    error_message: String,
    query: String,
    request_id: String,
    environment_status: EnvironmentStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentStatus {
    has_gemini_key: bool,
    has_pinecone_key: bool,
    has_index_name: bool,
}

impl From<CredentialStatus> for EnvironmentStatus {
    fn from(status: CredentialStatus) -> Self {
        Self {
            has_gemini_key: status.gemini_key,
            has_pinecone_key: status.pinecone_key,
            has_index_name: status.index_name,
        }
    }
}

/// POST /api/chat: answer a student question.
pub(crate) async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let request_id = Uuid::new_v4();
    info!(
        %request_id,
        chars = payload.message.chars().count(),
        "Chat request received"
    );

    let outcome = tokio::time::timeout(
        state.request_deadline,
        state.service.respond(&payload.message),
    )
    .await;

    match outcome {
        Ok(Ok(reply)) => {
            info!(
                %request_id,
                sources = reply.sources_used.len(),
                degraded = reply.degraded,
                "Chat request served"
            );
            success_response(&payload.message, reply)
        }
        Ok(Err(err)) => {
            if err.is_user_error() {
                warn!(%request_id, error = %err, "Chat request rejected");
            } else {
                error!(%request_id, kind = err.kind(), error = %err, "Chat request failed");
            }
            failure_response(&state, &err, &payload.message, request_id)
        }
        Err(_) => {
            error!(
                %request_id,
                deadline_secs = state.request_deadline.as_secs(),
                "Chat request hit the deadline"
            );
            deadline_response(&state, &payload.message, request_id)
        }
    }
}

fn success_response(query: &str, reply: Reply) -> Response {
    let response_length = reply.text.chars().count();
    let has_relevant_content = reply.has_relevant_content();
    let metadata = ChatMetadata {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: reply.timestamp,
        query: query.to_string(),
        context: reply.tags,
        sources_used: reply.sources_used,
        results_found: reply.match_count,
        relevant_results: reply.relevant_count,
        has_relevant_content,
        degraded: reply.degraded,
        response_length,
    };
    let body = ChatSuccess {
        response: reply.text,
        success: true,
        metadata,
    };
    (StatusCode::OK, Json(body)).into_response()
}

fn failure_response(
    state: &GatewayState,
    err: &Error,
    query: &str,
    request_id: Uuid,
) -> Response {
    let (status, error, message) = match err {
        Error::Validation(detail) => (
            StatusCode::BAD_REQUEST,
            format!("Invalid input: {detail}"),
            "Please send a non-empty question and try again.".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Sorry! I encountered a technical issue while processing your question.".to_string(),
            "Please try again in a moment, or ask your question in a different way.".to_string(),
        ),
    };

    let debug = state.expose_debug.then(|| DebugInfo {
        error_type: err.kind().to_string(),
        error_message: err.to_string(),
        query: query.to_string(),
        request_id: request_id.to_string(),
        environment_status: state.credentials.into(),
    });

    let body = ChatFailure {
        success: false,
        error,
        message,
        debug,
    };
    (status, Json(body)).into_response()
}

fn deadline_response(state: &GatewayState, query: &str, request_id: Uuid) -> Response {
    let debug = state.expose_debug.then(|| DebugInfo {
        error_type: "timeout".to_string(),
        error_message: format!(
            "no reply within the {}s deadline",
            state.request_deadline.as_secs()
        ),
        query: query.to_string(),
        request_id: request_id.to_string(),
        environment_status: state.credentials.into(),
    });

    let body = ChatFailure {
        success: false,
        error: "Sorry! That took longer than expected.".to_string(),
        message: "Please try again in a moment, or ask a shorter question.".to_string(),
        debug,
    };
    (StatusCode::GATEWAY_TIMEOUT, Json(body)).into_response()
}

// --- Readiness and method guard ---

#[derive(Serialize)]
pub(crate) struct ReadinessResponse {
    message: &'static str,
    status: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
    features: [&'static str; 4],
    usage: UsageHint,
}

#[derive(Serialize)]
struct UsageHint {
    endpoint: &'static str,
    payload: &'static str,
}

/// GET /api/chat: a readiness descriptor for anyone poking at the API.
pub(crate) async fn readiness_handler() -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        message: "Matric tutor API is running",
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        features: [
            "CAPS and IEB curricula, grades 8 to 12",
            "Curriculum-grounded answers from indexed study material",
            "Life Sciences and Physical Sciences focus",
            "South African context",
        ],
        usage: UsageHint {
            endpoint: "POST /api/chat",
            payload: r#"{ "message": "Your question here" }"#,
        },
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MethodNotAllowedResponse {
    error: &'static str,
    supported_methods: [&'static str; 3],
    message: &'static str,
    version: &'static str,
}

/// Any other method on /api/chat: 405 with the supported set.
pub(crate) async fn method_not_allowed_handler() -> Response {
    let body = MethodNotAllowedResponse {
        error: "Method not allowed",
        supported_methods: SUPPORTED_METHODS,
        message: "This endpoint only supports GET (health check) and POST (chat) requests.",
        version: env!("CARGO_PKG_VERSION"),
    };
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}
