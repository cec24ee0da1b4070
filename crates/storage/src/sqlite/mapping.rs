use sdg_core::model::{
    Goal, GoalId, Module, ModuleId, ProgressRecord, ProgressStatus, RawSection, UserId,
};
use serde_json::Value;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn goal_id_to_i64(id: GoalId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("goal_id overflow".into()))
}

pub(crate) fn goal_id_from_i64(v: i64) -> Result<GoalId, StorageError> {
    u64::try_from(v)
        .map(GoalId::new)
        .map_err(|_| StorageError::Serialization("goal_id sign overflow".into()))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_goal_row(row: &SqliteRow) -> Result<Goal, StorageError> {
    Goal::new(
        goal_id_from_i64(row.try_get("id").map_err(ser)?)?,
        u32_from_i64("display_id", row.try_get("display_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_module_row(row: &SqliteRow) -> Result<Module, StorageError> {
    let id: ModuleId = row
        .try_get::<String, _>("id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    Module::from_persisted(
        id,
        goal_id_from_i64(row.try_get("goal_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("subtitle").map_err(ser)?,
        u32_from_i64("order_id", row.try_get("order_id").map_err(ser)?)?,
    )
    .map_err(ser)
}

/// Section rows are returned unvalidated. A payload that is not even JSON is
/// passed through as a string so section parsing reports it.
pub(crate) fn map_section_row(row: &SqliteRow) -> Result<RawSection, StorageError> {
    let data: String = row.try_get("data").map_err(ser)?;
    let data = serde_json::from_str(&data).unwrap_or(Value::String(data));
    Ok(RawSection {
        id: row.try_get("id").map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        order_id: row.try_get("order_id").map_err(ser)?,
        kind: row.try_get("type").map_err(ser)?,
        data,
    })
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let status: ProgressStatus = row
        .try_get::<String, _>("status")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let module_id: ModuleId = row
        .try_get::<String, _>("module_id")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    Ok(ProgressRecord::new(
        UserId::new(row.try_get::<String, _>("user_id").map_err(ser)?),
        module_id,
        status,
        row.try_get("updated_at").map_err(ser)?,
    ))
}
