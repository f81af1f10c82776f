//! The validated student question.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A non-empty, trimmed student question.
///
/// Constructed once per incoming request via [`Question::parse`], which is the
/// single place input validation happens. Everything downstream can rely on
/// the text being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Question(String);

impl Question {
    /// Trim and validate raw input.
    ///
    /// Returns [`Error::Validation`] for empty or whitespace-only input,
    /// before any external call is attempted.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation(
                "message is required and must be a non-empty string".into(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The question text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Question {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_whitespace() {
        let q = Question::parse("  What is osmosis?  ").unwrap();
        assert_eq!(q.as_str(), "What is osmosis?");
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(Question::parse(""), Err(Error::Validation(_))));
        assert!(matches!(Question::parse("   \t\n"), Err(Error::Validation(_))));
    }

    #[test]
    fn displays_as_text() {
        let q = Question::parse("Explain meiosis").unwrap();
        assert_eq!(q.to_string(), "Explain meiosis");
        assert_eq!(q.char_len(), 15);
    }
}
