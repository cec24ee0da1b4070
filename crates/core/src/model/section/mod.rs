mod data;
mod error;
mod flashcards;
mod quiz;
mod raw;
#[allow(clippy::module_inception)]
mod section;

pub use data::{SectionData, SectionKind, TextData};
pub use error::{MalformedReason, MalformedSectionError};
pub use flashcards::{CardPair, FlashcardsData, FlashcardsError};
pub use quiz::{CorrectAnswer, QuizData, QuizError};
pub use raw::RawSection;
pub use section::Section;
