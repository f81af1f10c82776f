//! # Matric Pipeline
//!
//! The retrieval-augmented answer pipeline behind the tutor:
//!
//! 1. **Detect** — infer curriculum/grade/subject tags from the question
//! 2. **Retrieve** — embed the question, search the vector index under a
//!    tag filter
//! 3. **Assemble** — threshold, order, truncate, and attribute passages
//! 4. **Prompt** — compose persona, context, and question
//! 5. **Generate** — call the model and package a [`Reply`]
//!
//! [`TutorService`] wires the stages together and owns the degradation
//! policy: a failed retrieval produces an answer without curriculum
//! context, a failed generation fails the request.

pub mod assemble;
pub mod detect;
pub mod prompt;
pub mod retrieve;
pub mod service;

pub use assemble::{AssembledContext, ContextAssembler};
pub use detect::TagDetector;
pub use prompt::PromptBuilder;
pub use retrieve::Retriever;
pub use service::{Reply, TutorService};

#[cfg(test)]
pub(crate) mod test_helpers;
