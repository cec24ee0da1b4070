//! Module player: walks a learner through a module's sections.
//!
//! Quiz sections lock as soon as a correct answer is submitted. A wrong
//! answer holds the quiz at `Submitted{correct: false}` until `acknowledge`
//! moves it to `RetryAvailable`. Text and flashcards sections move
//! `Unviewed -> Viewed`.
//! The cursor only advances past a section in a terminal state, and running
//! off the end completes the module exactly once.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::{MalformedSectionError, ModuleId, RawSection, Section, SectionKind, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlayerError {
    #[error("module is complete; there is no current section")]
    NoCurrentSection,

    #[error("current section is not a quiz")]
    NotAQuiz,

    #[error("quiz sections are finished by answering, not viewing")]
    NotViewable,

    #[error("`{0}` is not an option of this quiz")]
    UnknownOption(String),

    #[error("quiz is already answered correctly")]
    SectionLocked,

    #[error("feedback for the last submission must be acknowledged first")]
    AwaitingAcknowledgement,

    #[error("there is no submission awaiting acknowledgement")]
    NoFeedbackPending,

    #[error("section {index} has not been reached (furthest is {furthest})")]
    OutOfRange { index: usize, furthest: usize },
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Who is playing which module. Passed in explicitly, never looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayContext {
    pub user_id: UserId,
    pub module_id: ModuleId,
}

impl PlayContext {
    #[must_use]
    pub fn new(user_id: UserId, module_id: ModuleId) -> Self {
        Self { user_id, module_id }
    }
}

/// Per-section state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SectionState {
    Unviewed,
    Viewed,
    Unanswered,
    Submitted { correct: bool },
    LockedCorrect,
    RetryAvailable,
}

impl SectionState {
    fn initial(kind: SectionKind) -> Self {
        if kind.is_answerable() {
            SectionState::Unanswered
        } else {
            SectionState::Unviewed
        }
    }

    /// The cursor may move past a section only in these states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SectionState::Viewed | SectionState::LockedCorrect)
    }
}

/// Emitted once when the learner runs past the last section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCompleted {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub sections_played: usize,
}

/// Result of [`ModulePlayer::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Current section is not finished yet; nothing changed.
    Blocked,
    Moved { index: usize },
    /// First completion of this play session.
    Completed(ModuleCompleted),
    /// Already past the end; completion is not reported again.
    AlreadyComplete,
}

/// Snapshot for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerProgress {
    pub finished: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone)]
struct Slot {
    section: Section,
    state: SectionState,
    selection: BTreeSet<String>,
    attempts: u32,
}

type OnComplete = Box<dyn FnOnce(&ModuleCompleted) + Send>;

//
// ─── PLAYER ────────────────────────────────────────────────────────────────────
//

pub struct ModulePlayer {
    ctx: PlayContext,
    slots: Vec<Slot>,
    cursor: usize,
    furthest: usize,
    completed: Option<ModuleCompleted>,
    on_complete: Option<OnComplete>,
    skipped: Vec<MalformedSectionError>,
}

impl fmt::Debug for ModulePlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModulePlayer")
            .field("ctx", &self.ctx)
            .field("slots", &self.slots)
            .field("cursor", &self.cursor)
            .field("furthest", &self.furthest)
            .field("completed", &self.completed)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}

impl ModulePlayer {
    /// Starts a play session over `sections`, played in `order_id` order.
    ///
    /// A module without sections is complete from the start.
    #[must_use]
    pub fn new(ctx: PlayContext, mut sections: Vec<Section>) -> Self {
        sections.sort_by_key(Section::order_id);
        let slots: Vec<Slot> = sections
            .into_iter()
            .map(|section| Slot {
                state: SectionState::initial(section.kind()),
                section,
                selection: BTreeSet::new(),
                attempts: 0,
            })
            .collect();

        let mut player = Self {
            ctx,
            slots,
            cursor: 0,
            furthest: 0,
            completed: None,
            on_complete: None,
            skipped: Vec::new(),
        };
        if player.slots.is_empty() {
            player.completed = Some(player.completion_event());
        }
        player
    }

    /// Starts a session from persisted records. Records that fail validation
    /// are left out of the sequence and reported by [`ModulePlayer::skipped`].
    #[must_use]
    pub fn from_raw(ctx: PlayContext, records: &[RawSection]) -> Self {
        let mut sections = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();
        for record in records {
            match record.parse() {
                Ok(section) => sections.push(section),
                Err(err) => skipped.push(err),
            }
        }
        let mut player = Self::new(ctx, sections);
        player.skipped = skipped;
        player
    }

    /// Registers the completion callback.
    ///
    /// It runs at most once per session. If the module is already complete
    /// (no sections) it runs immediately.
    #[must_use]
    pub fn with_on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&ModuleCompleted) + Send + 'static,
    {
        match &self.completed {
            Some(event) => callback(event),
            None => self.on_complete = Some(Box::new(callback)),
        }
        self
    }

    // Accessors
    #[must_use]
    pub fn context(&self) -> &PlayContext {
        &self.ctx
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.is_some()
    }

    #[must_use]
    pub fn completion(&self) -> Option<&ModuleCompleted> {
        self.completed.as_ref()
    }

    #[must_use]
    pub fn skipped(&self) -> &[MalformedSectionError] {
        &self.skipped
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.slots.iter().map(|slot| &slot.section)
    }

    /// Cursor position; equals `len()` once the module is complete.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn current(&self) -> Option<&Section> {
        self.slots.get(self.cursor).map(|slot| &slot.section)
    }

    #[must_use]
    pub fn current_state(&self) -> Option<SectionState> {
        self.slots.get(self.cursor).map(|slot| slot.state)
    }

    #[must_use]
    pub fn state_at(&self, index: usize) -> Option<SectionState> {
        self.slots.get(index).map(|slot| slot.state)
    }

    /// Options currently selected on the current quiz.
    #[must_use]
    pub fn selection(&self) -> Option<&BTreeSet<String>> {
        self.slots.get(self.cursor).map(|slot| &slot.selection)
    }

    /// Number of submissions made on the current section.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.slots.get(self.cursor).map_or(0, |slot| slot.attempts)
    }

    #[must_use]
    pub fn progress(&self) -> PlayerProgress {
        let total = self.slots.len();
        let finished = self.slots.iter().filter(|s| s.state.is_terminal()).count();
        let percent = if total == 0 {
            100
        } else {
            u8::try_from(finished * 100 / total).unwrap_or(100)
        };
        PlayerProgress {
            finished,
            total,
            percent,
        }
    }

    fn current_slot_mut(&mut self) -> Result<&mut Slot, PlayerError> {
        self.slots
            .get_mut(self.cursor)
            .ok_or(PlayerError::NoCurrentSection)
    }

    fn current_quiz_slot(&mut self) -> Result<&mut Slot, PlayerError> {
        let slot = self.current_slot_mut()?;
        if slot.section.kind().is_answerable() {
            Ok(slot)
        } else {
            Err(PlayerError::NotAQuiz)
        }
    }

    //
    // ─── LEARNER ACTIONS ───────────────────────────────────────────────────────
    //

    /// Clicks an option on the current quiz.
    ///
    /// Single-answer quizzes replace the selection, multi-answer quizzes toggle
    /// the clicked option.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError` if there is no current quiz, the option is unknown,
    /// the quiz is locked, or feedback is still pending.
    pub fn select(&mut self, option: &str) -> Result<(), PlayerError> {
        let slot = self.current_quiz_slot()?;
        match slot.state {
            SectionState::LockedCorrect => return Err(PlayerError::SectionLocked),
            SectionState::Submitted { .. } => return Err(PlayerError::AwaitingAcknowledgement),
            _ => {}
        }
        let Some(quiz) = slot.section.data().as_quiz() else {
            return Err(PlayerError::NotAQuiz);
        };
        if !quiz.has_option(option) {
            return Err(PlayerError::UnknownOption(option.to_owned()));
        }
        if quiz.is_multi_answer() {
            if !slot.selection.remove(option) {
                slot.selection.insert(option.to_owned());
            }
        } else {
            slot.selection.clear();
            slot.selection.insert(option.to_owned());
        }
        Ok(())
    }

    /// Submits the current selection and returns whether it was correct.
    ///
    /// A correct answer locks the quiz right away, so `advance` can move on.
    /// A wrong one waits for `acknowledge`. An empty selection is accepted
    /// and evaluates as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError` if there is no current quiz, it is locked, or the
    /// previous submission has not been acknowledged.
    pub fn submit(&mut self) -> Result<bool, PlayerError> {
        let slot = self.current_quiz_slot()?;
        match slot.state {
            SectionState::LockedCorrect => return Err(PlayerError::SectionLocked),
            SectionState::Submitted { .. } => return Err(PlayerError::AwaitingAcknowledgement),
            _ => {}
        }
        let Some(quiz) = slot.section.data().as_quiz() else {
            return Err(PlayerError::NotAQuiz);
        };
        let correct = quiz.check(slot.selection.iter().map(String::as_str));
        slot.attempts += 1;
        slot.state = if correct {
            SectionState::LockedCorrect
        } else {
            SectionState::Submitted { correct: false }
        };
        Ok(correct)
    }

    /// Dismisses the feedback for a wrong answer: clears the selection and
    /// allows another try.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoFeedbackPending` unless a wrong answer was just
    /// submitted.
    pub fn acknowledge(&mut self) -> Result<SectionState, PlayerError> {
        let slot = self.current_quiz_slot()?;
        if !matches!(slot.state, SectionState::Submitted { correct: false }) {
            return Err(PlayerError::NoFeedbackPending);
        }
        slot.selection.clear();
        slot.state = SectionState::RetryAvailable;
        Ok(slot.state)
    }

    /// Acknowledges a text or flashcards section. Repeating it is harmless.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NotViewable` on a quiz and
    /// `PlayerError::NoCurrentSection` once complete.
    pub fn mark_viewed(&mut self) -> Result<(), PlayerError> {
        let slot = self.current_slot_mut()?;
        if slot.section.kind().is_answerable() {
            return Err(PlayerError::NotViewable);
        }
        slot.state = SectionState::Viewed;
        Ok(())
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Moves the cursor forward if the current section is finished.
    pub fn advance(&mut self) -> Advance {
        let Some(slot) = self.slots.get(self.cursor) else {
            return Advance::AlreadyComplete;
        };
        if !slot.state.is_terminal() {
            return Advance::Blocked;
        }

        self.cursor += 1;
        if self.cursor < self.slots.len() {
            self.furthest = self.furthest.max(self.cursor);
            return Advance::Moved { index: self.cursor };
        }

        if self.completed.is_some() {
            return Advance::AlreadyComplete;
        }
        let event = self.completion_event();
        self.completed = Some(event.clone());
        if let Some(callback) = self.on_complete.take() {
            callback(&event);
        }
        Advance::Completed(event)
    }

    /// Jumps back (or forward) to a section the learner has already reached.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::OutOfRange` for a section beyond the furthest one
    /// reached.
    pub fn go_to(&mut self, index: usize) -> Result<(), PlayerError> {
        if index >= self.slots.len() || index > self.furthest {
            return Err(PlayerError::OutOfRange {
                index,
                furthest: self.furthest,
            });
        }
        self.cursor = index;
        Ok(())
    }

    fn completion_event(&self) -> ModuleCompleted {
        ModuleCompleted {
            user_id: self.ctx.user_id.clone(),
            module_id: self.ctx.module_id,
            sections_played: self.slots.len(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
