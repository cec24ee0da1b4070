use serde::Serialize;
use thiserror::Error;

use crate::model::ids::{GoalId, ModuleId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,
}

/// A unit of learning content inside a goal.
///
/// The module's sections are held by its parent tree, not by this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    id: ModuleId,
    goal_id: GoalId,
    title: String,
    subtitle: Option<String>,
    order_id: u32,
}

impl Module {
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is blank.
    pub fn new(
        id: ModuleId,
        goal_id: GoalId,
        title: impl Into<String>,
        subtitle: Option<String>,
    ) -> Result<Self, ModuleError> {
        Self::from_persisted(id, goal_id, title, subtitle, 0)
    }

    /// Rehydrate a module from storage.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is blank.
    pub fn from_persisted(
        id: ModuleId,
        goal_id: GoalId,
        title: impl Into<String>,
        subtitle: Option<String>,
        order_id: u32,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        let subtitle = subtitle
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        Ok(Self {
            id,
            goal_id,
            title: title.trim().to_owned(),
            subtitle,
            order_id,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn goal_id(&self) -> GoalId {
        self.goal_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    #[must_use]
    pub fn order_id(&self) -> u32 {
        self.order_id
    }

    pub(crate) fn set_order_id(&mut self, order_id: u32) {
        self.order_id = order_id;
    }

    /// Applies a field-level patch; id, goal and position are untouched.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the patched title is blank.
    pub fn apply(&self, patch: ModulePatch) -> Result<Self, ModuleError> {
        Self::from_persisted(
            self.id,
            self.goal_id,
            patch.title.unwrap_or_else(|| self.title.clone()),
            patch.subtitle.or_else(|| self.subtitle.clone()),
            self.order_id,
        )
    }
}

/// Field-level edit of a module. An empty subtitle clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModulePatch {
    pub title: Option<String>,
    pub subtitle: Option<String>,
}
