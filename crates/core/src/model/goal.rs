use serde::Serialize;
use thiserror::Error;

use crate::model::ids::GoalId;

/// Official SDGs are numbered 1 through 17.
pub const SDG_DISPLAY_RANGE: std::ops::RangeInclusive<u32> = 1..=17;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GoalError {
    #[error("goal title cannot be empty")]
    EmptyTitle,

    #[error("goal display id must be between 1 and 17, got {0}")]
    InvalidDisplayId(u32),
}

/// Top-level subject area (one Sustainable Development Goal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Goal {
    id: GoalId,
    display_id: u32,
    title: String,
    description: Option<String>,
}

impl Goal {
    /// Creates a goal, trimming title and description.
    ///
    /// # Errors
    ///
    /// Returns `GoalError::EmptyTitle` for a blank title and
    /// `GoalError::InvalidDisplayId` outside 1..=17.
    pub fn new(
        id: GoalId,
        display_id: u32,
        title: impl Into<String>,
        description: Option<String>,
    ) -> Result<Self, GoalError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(GoalError::EmptyTitle);
        }
        if !SDG_DISPLAY_RANGE.contains(&display_id) {
            return Err(GoalError::InvalidDisplayId(display_id));
        }
        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            display_id,
            title: title.trim().to_owned(),
            description,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> GoalId {
        self.id
    }

    #[must_use]
    pub fn display_id(&self) -> u32 {
        self.display_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Applies a field-level patch, keeping the id.
    ///
    /// # Errors
    ///
    /// Same validation as [`Goal::new`].
    pub fn apply(&self, patch: GoalPatch) -> Result<Self, GoalError> {
        Self::new(
            self.id,
            patch.display_id.unwrap_or(self.display_id),
            patch.title.unwrap_or_else(|| self.title.clone()),
            patch.description.or_else(|| self.description.clone()),
        )
    }
}

/// Field-level edit of a goal. `None` leaves a field untouched; an empty
/// description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub display_id: Option<u32>,
}
