use std::sync::Arc;

use sdg_core::builder::{GoalBuilder, GoalTree, ModuleTree};
use sdg_core::model::{Goal, GoalId};
use storage::repository::{ContentRepository, GoalRepository, NewGoalRecord};
use tracing::{info, warn};

use crate::error::BuilderServiceError;

/// Loads goals into the builder and saves them back.
///
/// Editing itself happens on the returned [`GoalBuilder`]; nothing reaches the
/// store until [`BuilderService::save`] is called.
#[derive(Clone)]
pub struct BuilderService {
    goals: Arc<dyn GoalRepository>,
    content: Arc<dyn ContentRepository>,
}

impl BuilderService {
    #[must_use]
    pub fn new(goals: Arc<dyn GoalRepository>, content: Arc<dyn ContentRepository>) -> Self {
        Self { goals, content }
    }

    /// Create an empty goal.
    ///
    /// # Errors
    ///
    /// Returns `BuilderServiceError::Goal` for an invalid title or display id,
    /// or `BuilderServiceError::PersistenceUnavailable` if storing fails.
    pub async fn create_goal(
        &self,
        display_id: u32,
        title: String,
        description: Option<String>,
    ) -> Result<Goal, BuilderServiceError> {
        // Validate locally so bad input is a `Goal` error, not a storage one.
        Goal::new(GoalId::new(0), display_id, title.clone(), description.clone())?;
        let goal = self
            .goals
            .insert_new_goal(NewGoalRecord {
                display_id,
                title,
                description,
            })
            .await?;
        info!(goal_id = %goal.id(), display_id, "goal created");
        Ok(goal)
    }

    /// List goals ordered by display number.
    ///
    /// # Errors
    ///
    /// Returns `BuilderServiceError::PersistenceUnavailable` if loading fails.
    pub async fn list_goals(&self) -> Result<Vec<Goal>, BuilderServiceError> {
        Ok(self.goals.list_goals().await?)
    }

    /// Load a goal's stored tree.
    ///
    /// # Errors
    ///
    /// Returns `BuilderServiceError::GoalNotFound`, or
    /// `BuilderServiceError::MalformedSection` when a stored section cannot be
    /// read. Editing around a broken section would drop it on save.
    pub async fn load_tree(&self, goal_id: GoalId) -> Result<GoalTree, BuilderServiceError> {
        let goal = self
            .goals
            .get_goal(goal_id)
            .await?
            .ok_or(BuilderServiceError::GoalNotFound(goal_id))?;

        let mut modules = Vec::new();
        for module in self.content.list_modules(goal_id).await? {
            let mut sections = Vec::new();
            for raw in self.content.list_sections(module.id()).await? {
                let section = raw.parse().inspect_err(|err| {
                    warn!(
                        module_id = %module.id(),
                        section_id = %err.section_id,
                        reason = %err.reason,
                        "section could not be loaded"
                    );
                })?;
                sections.push(section);
            }
            modules.push(ModuleTree { module, sections });
        }
        Ok(GoalTree { goal, modules })
    }

    /// Open a goal for editing.
    ///
    /// # Errors
    ///
    /// See [`BuilderService::load_tree`]; also returns
    /// `BuilderServiceError::Builder` if the stored order ids collide.
    pub async fn open(&self, goal_id: GoalId) -> Result<GoalBuilder, BuilderServiceError> {
        let tree = self.load_tree(goal_id).await?;
        Ok(GoalBuilder::from_tree(tree)?)
    }

    /// Explicit save: writes the whole tree, last write wins.
    ///
    /// On failure the builder keeps its edits and stays dirty.
    ///
    /// # Errors
    ///
    /// Returns `BuilderServiceError::Ordering` if the tree is inconsistent, or
    /// `BuilderServiceError::PersistenceUnavailable` if storing fails.
    pub async fn save(&self, builder: &mut GoalBuilder) -> Result<(), BuilderServiceError> {
        let tree = builder.snapshot()?;
        if let Err(err) = self.content.save_tree(&tree).await {
            warn!(goal_id = %tree.goal.id(), error = %err, "builder save failed");
            return Err(err.into());
        }
        builder.mark_saved();
        info!(
            goal_id = %tree.goal.id(),
            modules = tree.modules.len(),
            sections = tree.section_count(),
            "goal saved"
        );
        Ok(())
    }
}
