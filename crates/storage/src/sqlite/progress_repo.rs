use sdg_core::model::{ModuleId, ProgressRecord, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO module_progress (user_id, module_id, status, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, module_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            WHERE
                CASE excluded.status WHEN 'done' THEN 2 WHEN 'doing' THEN 1 ELSE 0 END
                >
                CASE module_progress.status WHEN 'done' THEN 2 WHEN 'doing' THEN 1 ELSE 0 END
            ",
        )
        .bind(record.user_id.as_str())
        .bind(record.module_id.to_string())
        .bind(record.status.as_str())
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, module_id, status, updated_at
            FROM module_progress
            WHERE user_id = ?1 AND module_id = ?2
            ",
        )
        .bind(user_id.as_str())
        .bind(module_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, module_id, status, updated_at
            FROM module_progress
            WHERE user_id = ?1
            ORDER BY module_id ASC
            ",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }
}
