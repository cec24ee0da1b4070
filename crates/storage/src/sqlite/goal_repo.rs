use sdg_core::model::{Goal, GoalId};

use super::SqliteRepository;
use super::mapping::{conn, goal_id_from_i64, goal_id_to_i64, map_goal_row, ser};
use crate::repository::{GoalRepository, NewGoalRecord, StorageError};

#[async_trait::async_trait]
impl GoalRepository for SqliteRepository {
    async fn insert_new_goal(&self, goal: NewGoalRecord) -> Result<Goal, StorageError> {
        // Validate before touching the table; the placeholder id is replaced below.
        let draft = Goal::new(GoalId::new(0), goal.display_id, goal.title, goal.description)
            .map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO goals (display_id, title, description)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(i64::from(draft.display_id()))
        .bind(draft.title())
        .bind(draft.description())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Goal::new(
            goal_id_from_i64(res.last_insert_rowid())?,
            draft.display_id(),
            draft.title(),
            draft.description().map(ToOwned::to_owned),
        )
        .map_err(ser)
    }

    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO goals (id, display_id, title, description)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                display_id = excluded.display_id,
                title = excluded.title,
                description = excluded.description
            ",
        )
        .bind(goal_id_to_i64(goal.id())?)
        .bind(i64::from(goal.display_id()))
        .bind(goal.title())
        .bind(goal.description())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_goal(&self, id: GoalId) -> Result<Option<Goal>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, display_id, title, description
            FROM goals WHERE id = ?1
            ",
        )
        .bind(goal_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_goal_row).transpose()
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, display_id, title, description
            FROM goals
            ORDER BY display_id ASC, id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_goal_row).collect()
    }
}
