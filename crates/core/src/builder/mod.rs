//! Builder ordering engine.
//!
//! `OrderedList` keeps sibling `order_id`s equal to `0..n` after every
//! mutation; `GoalBuilder` applies it to a goal's modules and to each
//! module's sections.

mod goal_builder;
mod ordered;

use thiserror::Error;

use crate::model::{GoalError, ModuleError};

pub use goal_builder::{GoalBuilder, GoalTree, ModuleTree, SectionPatch};
pub use ordered::{Ordered, OrderedList, OrderingInvariantViolation, Placement};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuilderError {
    #[error("no item with id {0}")]
    NotFound(String),

    #[error("an item with id {0} already exists")]
    DuplicateId(String),

    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("update must not change the id of {0}")]
    IdChanged(String),

    #[error("module {module_id} belongs to goal {found}, not {expected}")]
    ForeignModule {
        module_id: String,
        expected: String,
        found: String,
    },

    #[error(transparent)]
    Goal(#[from] GoalError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Ordering(#[from] OrderingInvariantViolation),
}
