use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ids::{ModuleId, UserId};

/// Tri-state learner status.
///
/// Variants are ordered so that `max` is the monotonic merge
/// (`Todo < Doing < Done`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    #[default]
    Todo,
    Doing,
    Done,
}

impl ProgressStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::Todo => "todo",
            ProgressStatus::Doing => "doing",
            ProgressStatus::Done => "done",
        }
    }

    /// Monotonic merge: never moves backwards.
    #[must_use]
    pub fn advance(self, to: ProgressStatus) -> ProgressStatus {
        self.max(to)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProgressError(pub String);

impl fmt::Display for ParseProgressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid progress status: {}", self.0)
    }
}

impl std::error::Error for ParseProgressError {}

impl FromStr for ProgressStatus {
    type Err = ParseProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(ProgressStatus::Todo),
            "doing" => Ok(ProgressStatus::Doing),
            "done" => Ok(ProgressStatus::Done),
            other => Err(ParseProgressError(other.to_owned())),
        }
    }
}

/// Persisted status of one learner on one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub status: ProgressStatus,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(
        user_id: UserId,
        module_id: ModuleId,
        status: ProgressStatus,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            module_id,
            status,
            updated_at,
        }
    }
}
