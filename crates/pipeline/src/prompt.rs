//! Prompt construction — persona, retrieved context, and the student's
//! question composed into a single model input.
//!
//! Layout is fixed: persona first, then the curriculum content block (when
//! any was retrieved), then guidelines, then the labelled question and a
//! response cue. Retrieved content never precedes the persona and the
//! question always comes last.

use matric_core::Question;

use crate::assemble::AssembledContext;

/// Builds the full model prompt around a configured persona template.
pub struct PromptBuilder {
    persona: String,
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    /// Compose the prompt for one question.
    pub fn build(&self, context: &AssembledContext, question: &Question) -> String {
        let mut prompt = String::with_capacity(
            self.persona.len() + context.text.len() + question.as_str().len() + 512,
        );

        prompt.push_str(&self.persona);
        prompt.push_str("\n\n");

        if !context.is_empty() {
            prompt.push_str("**CURRICULUM CONTENT:**\n");
            prompt.push_str(&context.text);
            prompt.push_str("\n\n");
        }

        prompt.push_str("**IMPORTANT GUIDELINES:**\n");
        if context.is_empty() {
            prompt.push_str(
                "- Draw from your general subject knowledge and mention when your answer is not based on official curriculum material\n",
            );
        } else {
            prompt.push_str("- Use the curriculum content above as your PRIMARY reference\n");
        }
        prompt.push_str(
            "- Keep explanations clear and age-appropriate\n\
             - Use South African context and examples where relevant\n\
             - Be encouraging and supportive in your tone\n\
             - Break down complex concepts into understandable steps\n\
             - If asked about topics not in the curriculum content, still provide helpful general knowledge\n",
        );

        prompt.push_str("\n**Student's Question:** ");
        prompt.push_str(question.as_str());
        prompt.push_str("\n\n**Your Response:**");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(text: &str) -> Question {
        Question::parse(text).unwrap()
    }

    fn context(text: &str, sources: &[&str]) -> AssembledContext {
        AssembledContext {
            text: text.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn persona_precedes_context_precedes_question() {
        let builder = PromptBuilder::new("PERSONA-MARKER");
        let prompt = builder.build(
            &context("**notes.txt**\nCONTEXT-MARKER", &["notes.txt"]),
            &question("QUESTION-MARKER"),
        );

        let persona_pos = prompt.find("PERSONA-MARKER").unwrap();
        let context_pos = prompt.find("CONTEXT-MARKER").unwrap();
        let question_pos = prompt.find("QUESTION-MARKER").unwrap();
        assert!(persona_pos < context_pos);
        assert!(context_pos < question_pos);
        assert!(prompt.contains("**CURRICULUM CONTENT:**"));
        assert!(prompt.contains("PRIMARY reference"));
    }

    #[test]
    fn empty_context_switches_to_general_knowledge_guidelines() {
        let builder = PromptBuilder::new("You are Thuto.");
        let prompt = builder.build(&AssembledContext::empty(), &question("What is osmosis?"));

        assert!(!prompt.contains("**CURRICULUM CONTENT:**"));
        assert!(prompt.contains("general subject knowledge"));
        assert!(!prompt.contains("PRIMARY reference"));
        assert!(prompt.contains("**Student's Question:** What is osmosis?"));
    }

    #[test]
    fn prompt_ends_with_the_response_cue() {
        let builder = PromptBuilder::new("You are Thuto.");
        let prompt = builder.build(&AssembledContext::empty(), &question("Why is the sky blue?"));
        assert!(prompt.ends_with("**Your Response:**"));
    }
}
