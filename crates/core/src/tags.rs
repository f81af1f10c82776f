//! Curriculum tags attached to every question and every indexed passage.
//!
//! The string forms here are the exact metadata values stored in the vector
//! index, so serialization must stay stable across ingestion and retrieval.

use serde::{Deserialize, Serialize};

/// The curriculum a question or passage belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curriculum {
    #[default]
    Caps,
    Ieb,
}

impl Curriculum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Curriculum::Caps => "caps",
            Curriculum::Ieb => "ieb",
        }
    }
}

impl std::fmt::Display for Curriculum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Curriculum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "caps" => Ok(Curriculum::Caps),
            "ieb" => Ok(Curriculum::Ieb),
            other => Err(format!("unknown curriculum '{other}' (expected caps or ieb)")),
        }
    }
}

/// School grade, 8 through 12.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Grade8,
    Grade9,
    Grade10,
    Grade11,
    #[default]
    Grade12,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Grade8 => "grade8",
            Grade::Grade9 => "grade9",
            Grade::Grade10 => "grade10",
            Grade::Grade11 => "grade11",
            Grade::Grade12 => "grade12",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grade8" => Ok(Grade::Grade8),
            "grade9" => Ok(Grade::Grade9),
            "grade10" => Ok(Grade::Grade10),
            "grade11" => Ok(Grade::Grade11),
            "grade12" => Ok(Grade::Grade12),
            other => Err(format!("unknown grade '{other}' (expected grade8..grade12)")),
        }
    }
}

/// Subject focus. `General` means unconstrained and serializes to the empty
/// string, matching the metadata convention of the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "life-science")]
    LifeScience,
    #[serde(rename = "physical-science")]
    PhysicalScience,
    #[default]
    #[serde(rename = "")]
    General,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::LifeScience => "life-science",
            Subject::PhysicalScience => "physical-science",
            Subject::General => "",
        }
    }

    /// True when no subject was detected, i.e. the filter leaves it open.
    pub fn is_general(&self) -> bool {
        matches!(self, Subject::General)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "life-science" => Ok(Subject::LifeScience),
            "physical-science" => Ok(Subject::PhysicalScience),
            "" => Ok(Subject::General),
            other => Err(format!(
                "unknown subject '{other}' (expected life-science, physical-science, or empty)"
            )),
        }
    }
}

/// The complete tag set derived from a question.
///
/// Detection always yields all three fields, falling back to the defaults
/// (caps, grade12, general) where nothing matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTags {
    pub curriculum: Curriculum,
    pub grade: Grade,
    pub subject: Subject,
}

impl ContextTags {
    /// Build the index filter from this tag set.
    ///
    /// Only concrete fields constrain the search: a general subject is left
    /// out entirely rather than matched against the empty string.
    pub fn filter(&self) -> TagFilter {
        TagFilter {
            curriculum: Some(self.curriculum),
            grade: Some(self.grade),
            subject: (!self.subject.is_general()).then_some(self.subject),
        }
    }
}

impl std::fmt::Display for ContextTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.curriculum, self.grade)?;
        if !self.subject.is_general() {
            write!(f, "/{}", self.subject)?;
        }
        Ok(())
    }
}

/// Equality filter sent with a vector query. Absent fields are unconstrained.
///
/// Serializes to the index's plain `{"field": "value"}` equality form, with
/// `None` fields omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TagFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curriculum: Option<Curriculum>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<Grade>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,
}

impl TagFilter {
    /// True when no field constrains the search.
    pub fn is_empty(&self) -> bool {
        self.curriculum.is_none() && self.grade.is_none() && self.subject.is_none()
    }
}
