use async_trait::async_trait;
use sdg_core::builder::GoalTree;
use sdg_core::model::{
    Goal, GoalId, Module, ModuleId, ProgressRecord, RawSection, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Fields needed to create a goal; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewGoalRecord {
    pub display_id: u32,
    pub title: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Insert a goal and return it with its new id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored goal does not
    /// validate, or a connection error.
    async fn insert_new_goal(&self, goal: NewGoalRecord) -> Result<Goal, StorageError>;

    /// Persist or update a goal.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the goal cannot be stored.
    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError>;

    /// Fetch a goal by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_goal(&self, id: GoalId) -> Result<Option<Goal>, StorageError>;

    /// All goals ordered by their SDG display number.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_goals(&self) -> Result<Vec<Goal>, StorageError>;
}

/// Modules and sections of the content tree.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Modules of a goal ordered by `order_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_modules(&self, goal_id: GoalId) -> Result<Vec<Module>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError>;

    /// Sections of a module ordered by `order_id`, unvalidated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection failures. Bad payloads are returned
    /// as-is and left for the caller to reject.
    async fn list_sections(&self, module_id: ModuleId) -> Result<Vec<RawSection>, StorageError>;

    /// Persist or update one module record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError>;

    /// Persist or update one section record under `module_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the section cannot be stored.
    async fn upsert_section(
        &self,
        module_id: ModuleId,
        section: &RawSection,
    ) -> Result<(), StorageError>;

    /// Replace a goal's whole content tree with `tree`. Modules and sections
    /// missing from the tree are deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any part of the tree cannot be stored.
    async fn save_tree(&self, tree: &GoalTree) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Upsert one progress record. A stored status is never moved backwards.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Every progress record of a learner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError>;
}

/// Flattens a tree's sections into stored records tagged with their module.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the payload cannot be encoded.
pub fn tree_sections(tree: &GoalTree) -> Result<Vec<(ModuleId, RawSection)>, StorageError> {
    let mut out = Vec::with_capacity(tree.section_count());
    for module in &tree.modules {
        for section in &module.sections {
            let raw = section
                .to_raw()
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            out.push((module.module.id(), raw));
        }
    }
    Ok(out)
}

#[derive(Default)]
struct MemoryState {
    goals: HashMap<GoalId, Goal>,
    modules: HashMap<ModuleId, Module>,
    sections: HashMap<ModuleId, Vec<RawSection>>,
    progress: HashMap<(UserId, ModuleId), ProgressRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl GoalRepository for InMemoryRepository {
    async fn insert_new_goal(&self, goal: NewGoalRecord) -> Result<Goal, StorageError> {
        let mut guard = self.lock()?;
        let next = guard.goals.keys().map(GoalId::value).max().unwrap_or(0) + 1;
        let goal = Goal::new(GoalId::new(next), goal.display_id, goal.title, goal.description)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.goals.insert(goal.id(), goal.clone());
        Ok(goal)
    }

    async fn upsert_goal(&self, goal: &Goal) -> Result<(), StorageError> {
        self.lock()?.goals.insert(goal.id(), goal.clone());
        Ok(())
    }

    async fn get_goal(&self, id: GoalId) -> Result<Option<Goal>, StorageError> {
        Ok(self.lock()?.goals.get(&id).cloned())
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, StorageError> {
        let mut goals: Vec<Goal> = self.lock()?.goals.values().cloned().collect();
        goals.sort_by_key(|g| (g.display_id(), g.id()));
        Ok(goals)
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn list_modules(&self, goal_id: GoalId) -> Result<Vec<Module>, StorageError> {
        let mut modules: Vec<Module> = self
            .lock()?
            .modules
            .values()
            .filter(|m| m.goal_id() == goal_id)
            .cloned()
            .collect();
        modules.sort_by_key(Module::order_id);
        Ok(modules)
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        Ok(self.lock()?.modules.get(&id).cloned())
    }

    async fn list_sections(&self, module_id: ModuleId) -> Result<Vec<RawSection>, StorageError> {
        let mut sections = self
            .lock()?
            .sections
            .get(&module_id)
            .cloned()
            .unwrap_or_default();
        sections.sort_by_key(|s| s.order_id);
        Ok(sections)
    }

    async fn upsert_module(&self, module: &Module) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.goals.contains_key(&module.goal_id()) {
            return Err(StorageError::NotFound);
        }
        guard.modules.insert(module.id(), module.clone());
        Ok(())
    }

    async fn upsert_section(
        &self,
        module_id: ModuleId,
        section: &RawSection,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.modules.contains_key(&module_id) {
            return Err(StorageError::NotFound);
        }
        // A section belongs to exactly one module.
        for list in guard.sections.values_mut() {
            list.retain(|s| s.id != section.id);
        }
        guard
            .sections
            .entry(module_id)
            .or_default()
            .push(section.clone());
        Ok(())
    }

    async fn save_tree(&self, tree: &GoalTree) -> Result<(), StorageError> {
        let sections = tree_sections(tree)?;
        let goal_id = tree.goal.id();

        let mut guard = self.lock()?;
        let stale: Vec<ModuleId> = guard
            .modules
            .values()
            .filter(|m| m.goal_id() == goal_id)
            .map(Module::id)
            .collect();
        for id in stale {
            guard.modules.remove(&id);
            guard.sections.remove(&id);
        }

        guard.goals.insert(goal_id, tree.goal.clone());
        for module in &tree.modules {
            guard.modules.insert(module.module.id(), module.module.clone());
            guard.sections.insert(module.module.id(), Vec::new());
        }
        for (module_id, raw) in sections {
            guard.sections.entry(module_id).or_default().push(raw);
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let key = (record.user_id.clone(), record.module_id);
        match guard.progress.get(&key) {
            Some(existing) if existing.status >= record.status => {}
            _ => {
                guard.progress.insert(key, record.clone());
            }
        }
        Ok(())
    }

    async fn get_progress(
        &self,
        user_id: &UserId,
        module_id: ModuleId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(self
            .lock()?
            .progress
            .get(&(user_id.clone(), module_id))
            .cloned())
    }

    async fn list_progress(&self, user_id: &UserId) -> Result<Vec<ProgressRecord>, StorageError> {
        let mut records: Vec<ProgressRecord> = self
            .lock()?
            .progress
            .values()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.module_id);
        Ok(records)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub goals: Arc<dyn GoalRepository>,
    pub content: Arc<dyn ContentRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let goals: Arc<dyn GoalRepository> = Arc::new(repo.clone());
        let content: Arc<dyn ContentRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            goals,
            content,
            progress,
        }
    }
}
