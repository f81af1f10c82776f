//! # Matric Clients
//!
//! HTTP clients for the hosted services behind the tutor: Gemini for text
//! generation and embeddings, Pinecone for vector search. Each client
//! implements the corresponding `matric-core` trait ([`GenerativeModel`],
//! [`VectorIndex`]) so pipeline code never depends on a concrete vendor.
//!
//! Transient failures (timeouts, connection errors, 429s, 5xx) are retried
//! with exponential backoff and jitter; see [`retry`].

pub mod gemini;
pub mod pinecone;
pub mod retry;

pub use gemini::GeminiClient;
pub use pinecone::PineconeClient;
pub use retry::{RetryPolicy, retry_request};

use matric_config::AppConfig;
use matric_core::{Error, Result};

/// Build a Gemini client from application config.
///
/// Fails fast when the API key is missing so a misconfigured deployment
/// surfaces at startup rather than on the first user request.
pub fn gemini_from_config(config: &AppConfig) -> Result<GeminiClient> {
    let api_key = config.gemini.api_key.as_deref().unwrap_or("").trim();
    if api_key.is_empty() {
        return Err(Error::Config {
            message: "GEMINI_API_KEY is not set".into(),
        });
    }

    let client = GeminiClient::with_base_url(api_key, &config.gemini.base_url)
        .with_timeout(std::time::Duration::from_secs(config.gemini.timeout_secs))
        .with_retry(RetryPolicy::from_config(&config.retry));
    Ok(client)
}

/// Build a Pinecone client from application config.
///
/// When `index_host` is configured the data-plane host is used directly;
/// otherwise the control plane is asked to resolve it, which requires one
/// network round trip at startup.
pub async fn pinecone_from_config(config: &AppConfig) -> Result<PineconeClient> {
    let api_key = config.pinecone.api_key.as_deref().unwrap_or("").trim();
    if api_key.is_empty() {
        return Err(Error::Config {
            message: "PINECONE_API_KEY is not set".into(),
        });
    }
    let index_name = config.pinecone.index_name.as_deref().unwrap_or("").trim();
    if index_name.is_empty() {
        return Err(Error::Config {
            message: "PINECONE_INDEX_NAME is not set".into(),
        });
    }

    let client = match &config.pinecone.index_host {
        Some(host) if !host.trim().is_empty() => {
            PineconeClient::with_host(api_key, index_name, host.trim())
        }
        _ => PineconeClient::connect(api_key, index_name, &config.pinecone.control_url).await?,
    };

    Ok(client
        .with_timeout(std::time::Duration::from_secs(config.pinecone.timeout_secs))
        .with_retry(RetryPolicy::from_config(&config.retry)))
}
