use std::sync::Arc;

use sdg_core::model::{ModuleId, ProgressRecord, ProgressStatus, UserId};
use sdg_core::player::{Advance, ModulePlayer, PlayContext, PlayerError, SectionState};
use storage::repository::{ContentRepository, ProgressRepository};
use tracing::{debug, info, warn};

use crate::Clock;
use crate::error::PlayerServiceError;

/// One learner playing one module.
///
/// Quiz selection is local and synchronous. Actions that can finish a section
/// go through [`PlayerService`], which records progress.
#[derive(Debug)]
pub struct PlaySession {
    player: ModulePlayer,
    started: bool,
    unsaved: Option<ProgressStatus>,
}

impl PlaySession {
    fn new(player: ModulePlayer) -> Self {
        Self {
            player,
            started: false,
            unsaved: None,
        }
    }

    #[must_use]
    pub fn player(&self) -> &ModulePlayer {
        &self.player
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.player.context().module_id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.player.context().user_id
    }

    /// True while a progress write failed and has not been retried with
    /// [`PlayerService::flush`].
    #[must_use]
    pub fn has_unsaved_progress(&self) -> bool {
        self.unsaved.is_some()
    }

    /// # Errors
    ///
    /// See [`ModulePlayer::select`].
    pub fn select(&mut self, option: &str) -> Result<(), PlayerError> {
        self.player.select(option)
    }

    /// # Errors
    ///
    /// See [`ModulePlayer::go_to`].
    pub fn go_to(&mut self, index: usize) -> Result<(), PlayerError> {
        self.player.go_to(index)
    }

    fn queue(&mut self, status: ProgressStatus) {
        self.unsaved = Some(self.unsaved.map_or(status, |pending| pending.advance(status)));
    }

    fn section_finished(&mut self) {
        if !self.started {
            self.started = true;
            self.queue(ProgressStatus::Doing);
        }
    }
}

/// Runs play sessions and writes the learner's module progress.
///
/// `doing` is written once, when the first section of a session is finished;
/// `done` is written once, when the module completes.
#[derive(Clone)]
pub struct PlayerService {
    clock: Clock,
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl PlayerService {
    #[must_use]
    pub fn new(
        clock: Clock,
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            content,
            progress,
        }
    }

    /// Load a module and start playing it.
    ///
    /// Sections that fail validation are logged and left out. A module with
    /// no playable sections completes immediately.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::ModuleNotFound` for an unknown module and
    /// `PlayerServiceError::PersistenceUnavailable` if loading fails.
    pub async fn start(
        &self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> Result<PlaySession, PlayerServiceError> {
        let module = self
            .content
            .get_module(module_id)
            .await?
            .ok_or(PlayerServiceError::ModuleNotFound(module_id))?;
        let records = self.content.list_sections(module.id()).await?;

        let player = ModulePlayer::from_raw(PlayContext::new(user_id, module.id()), &records)
            .with_on_complete(|event| {
                info!(
                    user_id = %event.user_id,
                    module_id = %event.module_id,
                    sections = event.sections_played,
                    "module complete"
                );
            });
        for err in player.skipped() {
            warn!(
                module_id = %module_id,
                section_id = %err.section_id,
                reason = %err.reason,
                "skipping section that could not be loaded"
            );
        }
        debug!(module_id = %module_id, sections = player.len(), "play session started");

        let mut session = PlaySession::new(player);
        if session.player.is_complete() {
            session.queue(ProgressStatus::Done);
            self.flush(&mut session).await?;
        }
        Ok(session)
    }

    /// Acknowledge a text or flashcards section.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::Player` for an invalid action, or
    /// `PlayerServiceError::PersistenceUnavailable` if recording progress
    /// fails. The section stays viewed either way.
    pub async fn view(&self, session: &mut PlaySession) -> Result<(), PlayerServiceError> {
        session.player.mark_viewed()?;
        session.section_finished();
        self.flush(session).await
    }

    /// Submit the current quiz selection. A correct answer locks the quiz and
    /// counts as a finished section.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::Player` for an invalid action, or
    /// `PlayerServiceError::PersistenceUnavailable` if recording progress
    /// fails. The quiz stays locked either way.
    pub async fn submit(&self, session: &mut PlaySession) -> Result<bool, PlayerServiceError> {
        let correct = session.player.submit()?;
        if correct {
            session.section_finished();
            self.flush(session).await?;
        }
        Ok(correct)
    }

    /// Dismiss the feedback for a wrong answer so the learner can retry.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::Player` unless a wrong answer is awaiting
    /// acknowledgement.
    pub fn acknowledge(&self, session: &mut PlaySession) -> Result<SectionState, PlayerServiceError> {
        Ok(session.player.acknowledge()?)
    }

    /// Move to the next section, completing the module past the last one.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::PersistenceUnavailable` if the completion
    /// could not be recorded. The session is still complete; call
    /// [`PlayerService::flush`] to retry the write.
    pub async fn advance(&self, session: &mut PlaySession) -> Result<Advance, PlayerServiceError> {
        let advance = session.player.advance();
        if let Advance::Completed(_) = &advance {
            session.queue(ProgressStatus::Done);
            self.flush(session).await?;
        }
        Ok(advance)
    }

    /// Write any progress still pending for this session.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError::PersistenceUnavailable` if the store
    /// rejects the write; the status stays pending.
    pub async fn flush(&self, session: &mut PlaySession) -> Result<(), PlayerServiceError> {
        let Some(status) = session.unsaved else {
            return Ok(());
        };
        let record = ProgressRecord::new(
            session.user_id().clone(),
            session.module_id(),
            status,
            self.clock.now(),
        );
        match self.progress.upsert_progress(&record).await {
            Ok(()) => {
                debug!(
                    user_id = %record.user_id,
                    module_id = %record.module_id,
                    status = %status,
                    "progress recorded"
                );
                session.unsaved = None;
                Ok(())
            }
            Err(err) => {
                warn!(
                    user_id = %record.user_id,
                    module_id = %record.module_id,
                    error = %err,
                    "progress write failed"
                );
                Err(err.into())
            }
        }
    }
}
