use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates goals, modules, sections (payload stored as JSON text) and the
/// per-learner module progress table.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS goals (
                    id INTEGER PRIMARY KEY,
                    display_id INTEGER NOT NULL CHECK (display_id BETWEEN 1 AND 17),
                    title TEXT NOT NULL,
                    description TEXT
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS modules (
                    id TEXT PRIMARY KEY,
                    goal_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    subtitle TEXT,
                    order_id INTEGER NOT NULL CHECK (order_id >= 0),
                    FOREIGN KEY (goal_id) REFERENCES goals(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS sections (
                    id TEXT PRIMARY KEY,
                    module_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    order_id INTEGER NOT NULL,
                    type TEXT NOT NULL,
                    data TEXT NOT NULL,
                    FOREIGN KEY (module_id) REFERENCES modules(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS module_progress (
                    user_id TEXT NOT NULL,
                    module_id TEXT NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('todo', 'doing', 'done')),
                    updated_at TEXT NOT NULL,
                    PRIMARY KEY (user_id, module_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_modules_goal_order
                    ON modules(goal_id, order_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_sections_module_order
                    ON sections(module_id, order_id);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(version = 1, "schema migration applied");
    }

    Ok(())
}
