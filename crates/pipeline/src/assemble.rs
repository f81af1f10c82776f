//! Context assembly — turns scored index matches into a bounded, attributed
//! prompt block.
//!
//! Candidates below the relevance threshold are dropped, the rest are ordered
//! by descending score (stable on ties), truncated to a per-passage character
//! cap, and rendered as named blocks. Source names are tracked for citation.

use matric_core::index::ScoredMatch;

/// Fixed separator between passage blocks.
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Appended when a passage is cut at the character cap.
const TRUNCATION_MARKER: &str = "...";

/// Assembled prompt context with source attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// Concatenated passage blocks; empty when nothing relevant matched.
    pub text: String,
    /// Deduplicated source names in first-seen order.
    pub sources: Vec<String>,
}

impl AssembledContext {
    /// The no-relevant-content outcome. Valid, not an error.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            sources: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Filters, orders, truncates, and renders retrieved passages.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    relevance_threshold: f32,
    max_passages: usize,
    passage_char_cap: usize,
}

impl ContextAssembler {
    pub fn new(relevance_threshold: f32, max_passages: usize, passage_char_cap: usize) -> Self {
        Self {
            relevance_threshold,
            max_passages,
            passage_char_cap,
        }
    }

    pub fn from_config(config: &matric_config::PipelineConfig) -> Self {
        Self::new(
            config.relevance_threshold,
            config.max_passages,
            config.passage_char_cap,
        )
    }

    /// Candidates strictly above the relevance threshold, before the top-N
    /// cut. Reported in reply metadata.
    pub fn relevant_count(&self, candidates: &[ScoredMatch]) -> usize {
        candidates
            .iter()
            .filter(|m| m.score > self.relevance_threshold)
            .count()
    }

    /// Assemble prompt context from retrieval candidates.
    ///
    /// Pure and deterministic: the same candidates produce byte-identical
    /// output. Candidates without usable content are skipped without
    /// consuming a passage slot.
    pub fn assemble(&self, candidates: &[ScoredMatch]) -> AssembledContext {
        let mut kept: Vec<&ScoredMatch> = candidates
            .iter()
            .filter(|m| m.score > self.relevance_threshold)
            .collect();
        // Stable sort: equal scores keep their original order.
        kept.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut blocks: Vec<String> = Vec::new();
        let mut sources: Vec<String> = Vec::new();

        for candidate in kept {
            if blocks.len() == self.max_passages {
                break;
            }

            let Some(content) = resolve_content(candidate) else {
                continue;
            };
            let source = resolve_source(candidate, blocks.len() + 1);

            blocks.push(format!(
                "**{}**\n{}",
                source,
                truncate(content, self.passage_char_cap)
            ));
            if !sources.contains(&source) {
                sources.push(source);
            }
        }

        AssembledContext {
            text: blocks.join(BLOCK_SEPARATOR),
            sources,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&matric_config::PipelineConfig::default())
    }
}

/// Prefer `text`, fall back to `content`; blank values fall through.
fn resolve_content(candidate: &ScoredMatch) -> Option<&str> {
    [
        candidate.metadata.text.as_deref(),
        candidate.metadata.content.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.trim().is_empty())
}

/// Prefer `filename`, fall back to `source`, else a synthetic name from the
/// 1-based position in the kept sequence.
fn resolve_source(candidate: &ScoredMatch, position: usize) -> String {
    [
        candidate.metadata.filename.as_deref(),
        candidate.metadata.source.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| format!("Source {position}"))
}

fn truncate(content: &str, cap: usize) -> String {
    if content.chars().count() <= cap {
        content.to_string()
    } else {
        let mut cut: String = content.chars().take(cap).collect();
        cut.push_str(TRUNCATION_MARKER);
        cut
    }
}
