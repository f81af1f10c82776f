//! HTTP API gateway for the matric tutoring service.
//!
//! Exposes the chat endpoint plus a liveness probe, with permissive CORS
//! for browser clients, request tracing, a body size limit, and a hard
//! per-request deadline so a hung upstream call cannot block the caller.
//!
//! Built on Axum.

pub mod chat;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::{Router, response::Json, routing::get};
use matric_config::{AppConfig, CredentialStatus};
use matric_core::index::VectorIndex;
use matric_core::model::GenerativeModel;
use matric_pipeline::TutorService;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub service: TutorService,
    /// Attach diagnostic detail to failure responses.
    pub expose_debug: bool,
    /// Hard per-request deadline for the chat endpoint.
    pub request_deadline: Duration,
    /// Credential presence booleans for the debug payload. Never values.
    pub credentials: CredentialStatus,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    pub fn new(service: TutorService, config: &AppConfig) -> Self {
        Self {
            service,
            expose_debug: config.gateway.expose_debug,
            request_deadline: Duration::from_secs(config.gateway.request_deadline_secs),
            credentials: config.credential_status(),
        }
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/chat",
            get(chat::readiness_handler)
                .post(chat::chat_handler)
                .fallback(chat::method_not_allowed_handler),
        )
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Verifies credentials before anything else, builds the Gemini and
/// Pinecone clients once, and serves until the process is stopped.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.require_credentials()?;

    let model: Arc<dyn GenerativeModel> = Arc::new(matric_clients::gemini_from_config(&config)?);
    let index: Arc<dyn VectorIndex> =
        Arc::new(matric_clients::pinecone_from_config(&config).await?);
    info!(model = %model.name(), index = %index.name(), "Gateway: clients ready");

    let service = TutorService::new(model, index, &config)?;
    let state = Arc::new(GatewayState::new(service, &config));

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedIndex, ScriptedModel, state_for};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint() {
        let state = state_for(
            Arc::new(ScriptedModel::answering("ok")),
            Arc::new(ScriptedIndex::returning(vec![])),
        );
        let app = build_router(state);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }
}
