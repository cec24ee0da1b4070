use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::builder_service::BuilderService;
use crate::error::AppServicesError;
use crate::player_service::PlayerService;
use crate::progress_service::ProgressService;

/// Assembles the services a host needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    player: Arc<PlayerService>,
    builder: Arc<BuilderService>,
    progress: Arc<ProgressService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if connecting or migrating fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Services over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let player = Arc::new(PlayerService::new(
            clock,
            Arc::clone(&storage.content),
            Arc::clone(&storage.progress),
        ));
        let builder = Arc::new(BuilderService::new(
            Arc::clone(&storage.goals),
            Arc::clone(&storage.content),
        ));
        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.goals),
            Arc::clone(&storage.content),
            Arc::clone(&storage.progress),
        ));
        Self {
            player,
            builder,
            progress,
        }
    }

    #[must_use]
    pub fn player(&self) -> Arc<PlayerService> {
        Arc::clone(&self.player)
    }

    #[must_use]
    pub fn builder(&self) -> Arc<BuilderService> {
        Arc::clone(&self.builder)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdg_core::time::fixed_now;
    use storage::sqlite::SqliteInitError;

    #[tokio::test]
    async fn unreachable_database_fails_to_bootstrap() {
        let err = AppServices::new_sqlite(
            "sqlite:file:/nonexistent-sdg-dir/content.db",
            Clock::fixed(fixed_now()),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(
            err,
            AppServicesError::Sqlite(SqliteInitError::Connect { .. })
        ));
    }
}
