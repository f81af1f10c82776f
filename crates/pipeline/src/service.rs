//! The tutoring service — orchestrates the full answer pipeline.
//!
//! # Flow
//!
//! 1. Validate the raw message into a [`Question`]
//! 2. Detect curriculum/grade/subject tags
//! 3. Retrieve scored passages from the vector index
//! 4. Assemble bounded context with source attribution
//! 5. Build the prompt and call the generation model
//! 6. Package the answer with provenance metadata
//!
//! Retrieval failure degrades to an answer without curriculum context;
//! generation failure fails the request. There is no fallback answer source.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use matric_config::AppConfig;
use matric_core::model::{GenerationConfig, GenerationRequest, GenerativeModel};
use matric_core::tags::ContextTags;
use matric_core::{Question, Result, index::VectorIndex};
use tracing::{debug, info, warn};

use crate::assemble::ContextAssembler;
use crate::detect::TagDetector;
use crate::prompt::PromptBuilder;
use crate::retrieve::Retriever;

/// The answer returned to the caller, with provenance.
#[derive(Debug, Clone)]
pub struct Reply {
    /// The model's answer text.
    pub text: String,
    /// Deduplicated source names behind the assembled context.
    pub sources_used: Vec<String>,
    /// Tags detected from the question.
    pub tags: ContextTags,
    /// Raw candidate count returned by the index.
    pub match_count: usize,
    /// Candidates strictly above the relevance threshold.
    pub relevant_count: usize,
    /// True when retrieval failed and the answer was generated without
    /// curriculum context.
    pub degraded: bool,
    pub timestamp: DateTime<Utc>,
}

impl Reply {
    /// Whether any curriculum content backed this answer.
    pub fn has_relevant_content(&self) -> bool {
        !self.sources_used.is_empty()
    }
}

/// Orchestrates detect → retrieve → assemble → prompt → generate.
///
/// Stateless per request; hold it behind an `Arc` and share it across
/// concurrent callers.
pub struct TutorService {
    detector: TagDetector,
    retriever: Retriever,
    assembler: ContextAssembler,
    prompts: PromptBuilder,
    model: Arc<dyn GenerativeModel>,
    chat_model: String,
    generation: GenerationConfig,
}

impl TutorService {
    /// Build the service from config.
    ///
    /// Fails when the configured persona file cannot be read; everything
    /// else is infallible wiring.
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        index: Arc<dyn VectorIndex>,
        config: &AppConfig,
    ) -> Result<Self> {
        let persona = config.persona()?;
        Ok(Self {
            detector: TagDetector::new(),
            retriever: Retriever::new(
                model.clone(),
                index,
                &config.gemini.embed_model,
                config.pipeline.top_k,
            ),
            assembler: ContextAssembler::from_config(&config.pipeline),
            prompts: PromptBuilder::new(persona),
            model,
            chat_model: config.gemini.model.clone(),
            generation: config.generation,
        })
    }

    /// Answer one student message.
    ///
    /// Validation happens first; no external call is made for empty input.
    pub async fn respond(&self, message: &str) -> Result<Reply> {
        let question = Question::parse(message)?;
        let tags = self.detector.detect(question.as_str());

        info!(tags = %tags, chars = question.char_len(), "Chat: question received");

        let (matches, degraded) = match self.retriever.search(&question, &tags).await {
            Ok(matches) => (matches, false),
            Err(e) => {
                warn!(error = %e, "Chat: retrieval failed, answering without context");
                (Vec::new(), true)
            }
        };

        let relevant_count = self.assembler.relevant_count(&matches);
        let context = self.assembler.assemble(&matches);
        let prompt = self.prompts.build(&context, &question);

        debug!(
            matches = matches.len(),
            relevant = relevant_count,
            sources = context.sources.len(),
            prompt_chars = prompt.chars().count(),
            "Chat: prompt assembled"
        );

        let request =
            GenerationRequest::new(&self.chat_model, prompt).with_config(self.generation);
        let generated = self.model.generate(request).await?;

        info!(
            answer_chars = generated.text.chars().count(),
            sources = context.sources.len(),
            degraded,
            "Chat: response generated"
        );

        Ok(Reply {
            text: generated.text,
            sources_used: context.sources,
            tags,
            match_count: matches.len(),
            relevant_count,
            degraded,
            timestamp: Utc::now(),
        })
    }
}
