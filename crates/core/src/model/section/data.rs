use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::MalformedReason;
use super::flashcards::FlashcardsData;
use super::quiz::QuizData;

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// Discriminant of a section variant, as persisted in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Text,
    Quiz,
    Flashcards,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Text, SectionKind::Quiz, SectionKind::Flashcards];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Text => "text",
            SectionKind::Quiz => "quiz",
            SectionKind::Flashcards => "flashcards",
        }
    }

    /// Title given to freshly created sections in the builder.
    #[must_use]
    pub fn default_title(self) -> &'static str {
        match self {
            SectionKind::Text => "Text Section",
            SectionKind::Quiz => "Quiz Section",
            SectionKind::Flashcards => "Flashcards Section",
        }
    }

    /// Only quizzes carry a notion of correctness.
    #[must_use]
    pub fn is_answerable(self) -> bool {
        matches!(self, SectionKind::Quiz)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = MalformedReason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(SectionKind::Text),
            "quiz" => Ok(SectionKind::Quiz),
            "flashcards" => Ok(SectionKind::Flashcards),
            other => Err(MalformedReason::UnknownType(other.to_owned())),
        }
    }
}

//
// ─── TEXT ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextData {
    content: String,
}

impl TextData {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

//
// ─── VARIANT PAYLOAD ───────────────────────────────────────────────────────────
//

/// Variant-specific payload of a section.
///
/// Serializes to the bare payload object; the discriminant travels separately
/// as the section `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    Text(TextData),
    Quiz(QuizData),
    Flashcards(FlashcardsData),
}

impl SectionData {
    #[must_use]
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionData::Text(_) => SectionKind::Text,
            SectionData::Quiz(_) => SectionKind::Quiz,
            SectionData::Flashcards(_) => SectionKind::Flashcards,
        }
    }

    /// Valid starter payload for a new section of the given kind.
    #[must_use]
    pub fn placeholder(kind: SectionKind) -> Self {
        match kind {
            SectionKind::Text => SectionData::Text(TextData::new("")),
            SectionKind::Quiz => SectionData::Quiz(QuizData::placeholder()),
            SectionKind::Flashcards => SectionData::Flashcards(FlashcardsData::placeholder()),
        }
    }

    #[must_use]
    pub fn as_quiz(&self) -> Option<&QuizData> {
        match self {
            SectionData::Quiz(quiz) => Some(quiz),
            _ => None,
        }
    }
}
