//! `SQLite` backend for goals, module content and learner progress.

use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::repository::{ContentRepository, GoalRepository, ProgressRepository, Storage};

mod content_repo;
mod goal_repo;
mod mapping;
mod migrate;
mod progress_repo;

/// Run on every new connection. Module and section rows cascade with their
/// goal, so foreign keys must be on for deletes to clean up content.
const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA busy_timeout = 5000;",
];

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Goal, content and progress repositories over one connection pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("could not open content store at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("content store migration failed: {0}")]
    Migrate(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL. The schema is left as is; see
    /// [`SqliteRepository::open`].
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Connect` if the database cannot be opened or
    /// a connection pragma fails.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .map_err(|source| SqliteInitError::Connect {
                url: database_url.to_owned(),
                source,
            })?;
        Ok(Self { pool })
    }

    /// Connect and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connecting or migrating fails.
    pub async fn open(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        info!(url = database_url, "content store ready");
        Ok(repo)
    }

    /// Create the goal, module, section and progress tables if missing.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError::Migrate` if a migration query fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// All three repositories backed by one `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::open(database_url).await?;
        Ok(Self {
            goals: Arc::new(repo.clone()) as Arc<dyn GoalRepository>,
            content: Arc::new(repo.clone()) as Arc<dyn ContentRepository>,
            progress: Arc::new(repo) as Arc<dyn ProgressRepository>,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_url(name: &str) -> String {
        format!("sqlite:file:{name}?mode=memory&cache=shared")
    }

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn connections_enforce_foreign_keys() {
        let repo = SqliteRepository::connect(&memory_url("memdb_pragmas"))
            .await
            .unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn open_applies_schema_once() {
        let url = memory_url("memdb_open");
        let repo = SqliteRepository::open(&url).await.unwrap();
        SqliteRepository::open(&url).await.unwrap();
        let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[tokio::test]
    async fn unreachable_database_reports_its_url() {
        let url = "sqlite:file:/nonexistent-sdg-dir/content.db";
        let err = SqliteRepository::connect(url).await.err().unwrap();
        assert!(matches!(&err, SqliteInitError::Connect { url: u, .. } if u == url));
        assert!(err.to_string().contains("/nonexistent-sdg-dir/content.db"));
    }
}
