//! Persistence for goals, modules, sections and learner progress.
//!
//! `repository` holds the async contracts and an in-memory backend;
//! `sqlite` implements them on top of `sqlx`.

pub mod repository;
pub mod sqlite;

pub use repository::{Storage, StorageError};
