mod goal;
mod ids;
mod module;
mod progress;
pub mod section;

pub use goal::{Goal, GoalError, GoalPatch, SDG_DISPLAY_RANGE};
pub use ids::{CardPairId, GoalId, ModuleId, ParseIdError, SectionId, UserId};
pub use module::{Module, ModuleError, ModulePatch};
pub use progress::{ParseProgressError, ProgressRecord, ProgressStatus};
pub use section::{
    CardPair, CorrectAnswer, FlashcardsData, FlashcardsError, MalformedReason,
    MalformedSectionError, QuizData, QuizError, RawSection, Section, SectionData, SectionKind,
    TextData,
};
