//! Shared error types for the services crate.
//!
//! Storage failures surface as `PersistenceUnavailable`; in-memory player and
//! builder state is left as it was so the host can retry or warn the user.

use thiserror::Error;

use sdg_core::builder::{BuilderError, OrderingInvariantViolation};
use sdg_core::model::{
    FlashcardsError, GoalError, GoalId, MalformedSectionError, ModuleId, QuizError,
};
use sdg_core::player::PlayerError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `PlayerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerServiceError {
    #[error("module {0} not found")]
    ModuleNotFound(ModuleId),
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error("progress could not be saved: {0}")]
    PersistenceUnavailable(#[from] StorageError),
}

/// Errors emitted by `BuilderService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderServiceError {
    #[error("goal {0} not found")]
    GoalNotFound(GoalId),
    #[error(transparent)]
    Goal(#[from] GoalError),
    #[error(transparent)]
    Builder(#[from] BuilderError),
    #[error(transparent)]
    Ordering(#[from] OrderingInvariantViolation),
    #[error(transparent)]
    MalformedSection(#[from] MalformedSectionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Flashcards(#[from] FlashcardsError),
    #[error("changes could not be saved: {0}")]
    PersistenceUnavailable(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("goal {0} not found")]
    GoalNotFound(GoalId),
    #[error("module {0} not found")]
    ModuleNotFound(ModuleId),
    #[error("progress could not be loaded: {0}")]
    PersistenceUnavailable(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
