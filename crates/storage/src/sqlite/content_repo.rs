use sdg_core::builder::GoalTree;
use sdg_core::model::{GoalId, Module, ModuleId, RawSection};
use sqlx::{Sqlite, Transaction};
use tracing::debug;

use super::SqliteRepository;
use super::mapping::{conn, goal_id_to_i64, map_module_row, map_section_row, ser};
use crate::repository::{ContentRepository, StorageError, tree_sections};

const UPSERT_GOAL: &str = r"
    INSERT INTO goals (id, display_id, title, description)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(id) DO UPDATE SET
        display_id = excluded.display_id,
        title = excluded.title,
        description = excluded.description
";

const UPSERT_MODULE: &str = r"
    INSERT INTO modules (id, goal_id, title, subtitle, order_id)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(id) DO UPDATE SET
        goal_id = excluded.goal_id,
        title = excluded.title,
        subtitle = excluded.subtitle,
        order_id = excluded.order_id
";

const UPSERT_SECTION: &str = r"
    INSERT INTO sections (id, module_id, title, order_id, type, data)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(id) DO UPDATE SET
        module_id = excluded.module_id,
        title = excluded.title,
        order_id = excluded.order_id,
        type = excluded.type,
        data = excluded.data
";

async fn upsert_module_in(
    tx: &mut Transaction<'_, Sqlite>,
    module: &Module,
) -> Result<(), StorageError> {
    sqlx::query(UPSERT_MODULE)
        .bind(module.id().to_string())
        .bind(goal_id_to_i64(module.goal_id())?)
        .bind(module.title())
        .bind(module.subtitle())
        .bind(i64::from(module.order_id()))
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
    Ok(())
}

async fn upsert_section_in(
    tx: &mut Transaction<'_, Sqlite>,
    module_id: ModuleId,
    section: &RawSection,
) -> Result<(), StorageError> {
    let data = serde_json::to_string(&section.data).map_err(ser)?;
    sqlx::query(UPSERT_SECTION)
        .bind(section.id.as_str())
        .bind(module_id.to_string())
        .bind(section.title.as_str())
        .bind(section.order_id)
        .bind(section.kind.as_str())
        .bind(data)
        .execute(&mut **tx)
        .await
        .map_err(conn)?;
    Ok(())
}

#[async_trait::async_trait]
impl ContentRepository for SqliteRepository {
    async fn list_modules(&self, goal_id: GoalId) -> Result<Vec<Module>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, goal_id, title, subtitle, order_id
            FROM modules
            WHERE goal_id = ?1
            ORDER BY order_id ASC
            ",
        )
        .bind(goal_id_to_i64(goal_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_module_row).collect()
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, goal_id, title, subtitle, order_id
            FROM modules WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_module_row).transpose()
    }

    async fn list_sections(&self, module_id: ModuleId) -> Result<Vec<RawSection>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, order_id, type, data
            FROM sections
            WHERE module_id = ?1
            ORDER BY order_id ASC
            ",
        )
        .bind(module_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_section_row).collect()
    }

    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        upsert_module_in(&mut tx, module).await?;
        tx.commit().await.map_err(conn)
    }

    async fn upsert_section(
        &self,
        module_id: ModuleId,
        section: &RawSection,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        upsert_section_in(&mut tx, module_id, section).await?;
        tx.commit().await.map_err(conn)
    }

    async fn save_tree(&self, tree: &GoalTree) -> Result<(), StorageError> {
        let sections = tree_sections(tree)?;
        let goal = &tree.goal;
        let goal_id = goal_id_to_i64(goal.id())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(UPSERT_GOAL)
            .bind(goal_id)
            .bind(i64::from(goal.display_id()))
            .bind(goal.title())
            .bind(goal.description())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        // Drop everything the tree no longer contains; cascades remove sections.
        let keep_modules: Vec<String> = tree
            .modules
            .iter()
            .map(|m| m.module.id().to_string())
            .collect();
        let existing: Vec<String> = sqlx::query_scalar("SELECT id FROM modules WHERE goal_id = ?1")
            .bind(goal_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?;
        for id in existing.iter().filter(|id| !keep_modules.contains(id)) {
            sqlx::query("DELETE FROM modules WHERE id = ?1")
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        for module in &tree.modules {
            upsert_module_in(&mut tx, &module.module).await?;
            let keep_sections: Vec<String> =
                module.sections.iter().map(|s| s.id().to_string()).collect();
            let existing: Vec<String> =
                sqlx::query_scalar("SELECT id FROM sections WHERE module_id = ?1")
                    .bind(module.module.id().to_string())
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(conn)?;
            for id in existing.iter().filter(|id| !keep_sections.contains(id)) {
                sqlx::query("DELETE FROM sections WHERE id = ?1")
                    .bind(id.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
            }
        }

        for (module_id, section) in &sections {
            upsert_section_in(&mut tx, *module_id, section).await?;
        }

        tx.commit().await.map_err(conn)?;
        debug!(
            goal_id = %goal.id(),
            modules = tree.modules.len(),
            sections = sections.len(),
            "goal tree written"
        );
        Ok(())
    }
}
