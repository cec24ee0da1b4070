use thiserror::Error;

use super::flashcards::FlashcardsError;
use super::quiz::QuizError;

/// A persisted section whose payload does not match its declared variant.
///
/// Carries the raw id so the offending record can be reported even when the
/// id itself failed to parse.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("section {section_id} could not be loaded: {reason}")]
pub struct MalformedSectionError {
    pub section_id: String,
    pub reason: MalformedReason,
}

impl MalformedSectionError {
    pub fn new(section_id: impl Into<String>, reason: impl Into<MalformedReason>) -> Self {
        Self {
            section_id: section_id.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedReason {
    #[error("section id is blank")]
    InvalidId,

    #[error("unknown section type `{0}`")]
    UnknownType(String),

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Flashcards(#[from] FlashcardsError),
}
