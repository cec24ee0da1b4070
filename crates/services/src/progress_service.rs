use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use sdg_core::model::{Goal, GoalId, Module, ModuleId, ProgressStatus, UserId};
use sdg_core::progress::{ProgressSnapshot, next_module};
use storage::repository::{ContentRepository, GoalRepository, ProgressRepository};

use crate::error::ProgressServiceError;

/// A module as the learner's goal page shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOverview {
    pub module_id: ModuleId,
    pub title: String,
    pub subtitle: Option<String>,
    pub status: ProgressStatus,
    pub unlocked: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A goal with derived status and its modules in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalOverview {
    pub goal_id: GoalId,
    pub display_id: u32,
    pub title: String,
    pub status: ProgressStatus,
    /// Module to continue with: the first one not done.
    pub featured: Option<ModuleId>,
    pub modules: Vec<ModuleOverview>,
}

/// Read-only progress views. Every call recomputes from stored records.
#[derive(Clone)]
pub struct ProgressService {
    goals: Arc<dyn GoalRepository>,
    content: Arc<dyn ContentRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        goals: Arc<dyn GoalRepository>,
        content: Arc<dyn ContentRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            goals,
            content,
            progress,
        }
    }

    /// Status of one module; `todo` when nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::PersistenceUnavailable` if loading fails.
    pub async fn module_status(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<ProgressStatus, ProgressServiceError> {
        let record = self.progress.get_progress(user_id, module_id).await?;
        Ok(record.map(|r| r.status).unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `ProgressServiceError::GoalNotFound` or
    /// `ProgressServiceError::PersistenceUnavailable`.
    pub async fn goal_overview(
        &self,
        user_id: &UserId,
        goal_id: GoalId,
    ) -> Result<GoalOverview, ProgressServiceError> {
        let goal = self
            .goals
            .get_goal(goal_id)
            .await?
            .ok_or(ProgressServiceError::GoalNotFound(goal_id))?;
        let records = self.progress.list_progress(user_id).await?;
        let snapshot = ProgressSnapshot::from_records(&records);
        let modules = self.content.list_modules(goal_id).await?;
        Ok(overview(&goal, &modules, &snapshot, |id| {
            records
                .iter()
                .find(|r| r.module_id == id)
                .map(|r| r.updated_at)
        }))
    }

    /// Overviews of every goal, ordered by display number.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::PersistenceUnavailable` if loading fails.
    pub async fn list_overviews(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<GoalOverview>, ProgressServiceError> {
        let records = self.progress.list_progress(user_id).await?;
        let snapshot = ProgressSnapshot::from_records(&records);
        let mut out = Vec::new();
        for goal in self.goals.list_goals().await? {
            let modules = self.content.list_modules(goal.id()).await?;
            out.push(overview(&goal, &modules, &snapshot, |id| {
                records
                    .iter()
                    .find(|r| r.module_id == id)
                    .map(|r| r.updated_at)
            }));
        }
        Ok(out)
    }

    /// Module after `module_id` within its goal, for forward navigation once
    /// a module is complete.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::ModuleNotFound` or
    /// `ProgressServiceError::PersistenceUnavailable`.
    pub async fn next_module(
        &self,
        module_id: ModuleId,
    ) -> Result<Option<Module>, ProgressServiceError> {
        let module = self
            .content
            .get_module(module_id)
            .await?
            .ok_or(ProgressServiceError::ModuleNotFound(module_id))?;
        let siblings = self.content.list_modules(module.goal_id()).await?;
        Ok(next_module(&siblings, module_id).cloned())
    }
}

fn overview<F>(
    goal: &Goal,
    modules: &[Module],
    snapshot: &ProgressSnapshot,
    updated_at: F,
) -> GoalOverview
where
    F: Fn(ModuleId) -> Option<DateTime<Utc>>,
{
    GoalOverview {
        goal_id: goal.id(),
        display_id: goal.display_id(),
        title: goal.title().to_owned(),
        status: snapshot.goal_status(modules),
        featured: snapshot.featured_module(modules).map(Module::id),
        modules: modules
            .iter()
            .map(|m| ModuleOverview {
                module_id: m.id(),
                title: m.title().to_owned(),
                subtitle: m.subtitle().map(ToOwned::to_owned),
                status: snapshot.module_status(m.id()),
                unlocked: snapshot.module_unlocked(modules, m.id()),
                updated_at: updated_at(m.id()),
            })
            .collect(),
    }
}
