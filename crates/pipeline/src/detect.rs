//! Context detection — infers curriculum, grade, and subject tags from raw
//! question text.
//!
//! Pure keyword and pattern matching over the lowercased message. Always
//! yields a complete tag set: unmatched fields fall back to the defaults
//! (caps, grade12, unconstrained subject).

use matric_core::tags::{ContextTags, Curriculum, Grade, Subject};
use regex::Regex;

/// Life-science markers. Checked before the physical-science list, so a
/// message naming both ("biology and chemistry") resolves to life-science.
const LIFE_SCIENCE_TERMS: [&str; 5] =
    ["life science", "biology", "dna", "evolution", "genetics"];

const PHYSICAL_SCIENCE_TERMS: [&str; 3] = ["physical science", "physics", "chemistry"];

const IEB_TERMS: [&str; 2] = ["ieb", "independent"];

/// Detects [`ContextTags`] from question text.
///
/// Compiles its grade patterns once; construct it at startup and share it.
pub struct TagDetector {
    grades: Vec<(Grade, Regex)>,
}

impl TagDetector {
    pub fn new() -> Self {
        let grades = [
            (Grade::Grade8, r"grade\s*8|gr\s*8|year\s*8"),
            (Grade::Grade9, r"grade\s*9|gr\s*9|year\s*9"),
            (Grade::Grade10, r"grade\s*10|gr\s*10|year\s*10"),
            (Grade::Grade11, r"grade\s*11|gr\s*11|year\s*11"),
            (Grade::Grade12, r"grade\s*12|gr\s*12|matric|year\s*12"),
        ]
        .into_iter()
        .map(|(grade, pattern)| {
            (
                grade,
                Regex::new(pattern).expect("grade pattern should compile"),
            )
        })
        .collect();

        Self { grades }
    }

    /// Detect tags for a message.
    ///
    /// Case-insensitive. Grade patterns are tested in ascending grade order
    /// and the first match wins; subjects and curriculum are substring checks.
    pub fn detect(&self, message: &str) -> ContextTags {
        let lower = message.to_lowercase();

        let grade = self
            .grades
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map(|(grade, _)| *grade)
            .unwrap_or_default();

        let subject = if LIFE_SCIENCE_TERMS.iter().any(|t| lower.contains(t)) {
            Subject::LifeScience
        } else if PHYSICAL_SCIENCE_TERMS.iter().any(|t| lower.contains(t)) {
            Subject::PhysicalScience
        } else {
            Subject::General
        };

        let curriculum = if IEB_TERMS.iter().any(|t| lower.contains(t)) {
            Curriculum::Ieb
        } else {
            Curriculum::Caps
        };

        ContextTags {
            curriculum,
            grade,
            subject,
        }
    }
}

impl Default for TagDetector {
    fn default() -> Self {
        Self::new()
    }
}
