//! # Matric Core
//!
//! Domain types, traits, and error definitions for the matric tutoring
//! service. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two external boundaries (vector index, generative model) are defined
//! as traits here. Implementations live in `matric-clients`; the pipeline
//! only ever sees the traits. This enables:
//! - Swapping hosted services via configuration
//! - Easy testing with mock implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod index;
pub mod model;
pub mod question;
pub mod tags;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GenerationError, Result, RetrievalError};
pub use index::{
    IndexDescription, IndexQuery, PassageMetadata, PassageRecord, ScoredMatch, VectorIndex,
};
pub use model::{
    EmbeddingRequest, EmbeddingResponse, EmbeddingTask, GenerationConfig, GenerationRequest,
    GenerationResponse, GenerativeModel, TokenUsage,
};
pub use question::Question;
pub use tags::{ContextTags, Curriculum, Grade, Subject, TagFilter};
