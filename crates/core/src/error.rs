//! Error types for the matric domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external boundary has its own error enum.

use thiserror::Error;

/// The top-level error type for all matric operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- User input ---
    #[error("Invalid question: {0}")]
    Validation(String),

    // --- Configuration ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Vector index boundary ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Generation model boundary ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable class name, used in logs and the debug payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Config { .. } => "configuration",
            Error::Retrieval(_) => "retrieval",
            Error::Generation(_) => "generation",
            Error::Internal(_) => "internal",
        }
    }

    /// True when the failure was caused by the caller's input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Boundary errors ---

/// Failures from the vector index boundary (embedding + similarity search).
///
/// These are recoverable: the response pipeline degrades to no-context mode
/// instead of failing the request.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Index request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by index, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Index authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Query embedding failed: {0}")]
    Embedding(String),

    #[error("Index request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl RetrievalError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalError::RateLimited { .. }
            | RetrievalError::Timeout(_)
            | RetrievalError::Network(_) => true,
            RetrievalError::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Failures from the generation model boundary.
///
/// These are fatal to the request: there is no fallback answer source.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("Model request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by model, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Model authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Model returned no usable text: {0}")]
    EmptyResponse(String),

    #[error("Model request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl GenerationError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::RateLimited { .. }
            | GenerationError::Timeout(_)
            | GenerationError::Network(_) => true,
            GenerationError::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}
