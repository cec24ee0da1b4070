use serde::Serialize;

use super::ordered::{Ordered, OrderedList, OrderingInvariantViolation, Placement};
use super::BuilderError;
use crate::model::{
    Goal, GoalPatch, Module, ModuleId, ModulePatch, Section, SectionData, SectionId, SectionKind,
};

impl Ordered for Section {
    type Id = SectionId;

    fn id(&self) -> SectionId {
        Section::id(self).clone()
    }

    fn order_id(&self) -> u32 {
        Section::order_id(self)
    }

    fn set_order_id(&mut self, order_id: u32) {
        Section::set_order_id(self, order_id);
    }
}

//
// ─── TREE SNAPSHOTS ────────────────────────────────────────────────────────────
//

/// A module with its sections in play order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleTree {
    pub module: Module,
    pub sections: Vec<Section>,
}

/// A goal with its modules in order; the unit the builder saves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalTree {
    pub goal: Goal,
    pub modules: Vec<ModuleTree>,
}

impl GoalTree {
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&ModuleTree> {
        self.modules.iter().find(|m| m.module.id() == id)
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.modules.iter().map(|m| m.sections.len()).sum()
    }
}

/// Field-level edit of a section. Never touches `id` or `order_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub data: Option<SectionData>,
}

impl SectionPatch {
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            data: None,
        }
    }

    #[must_use]
    pub fn data(data: SectionData) -> Self {
        Self {
            title: None,
            data: Some(data),
        }
    }

    fn apply(self, section: &Section) -> Section {
        let section = match self.title {
            Some(title) => section.with_title(title),
            None => section.clone(),
        };
        match self.data {
            Some(data) => section.with_data(data),
            None => section,
        }
    }
}

//
// ─── BUILDER ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleDraft {
    module: Module,
    sections: OrderedList<Section>,
}

impl Ordered for ModuleDraft {
    type Id = ModuleId;

    fn id(&self) -> ModuleId {
        self.module.id()
    }

    fn order_id(&self) -> u32 {
        self.module.order_id()
    }

    fn set_order_id(&mut self, order_id: u32) {
        self.module.set_order_id(order_id);
    }
}

/// In-memory editing session over one goal.
///
/// Every mutation leaves module and section order ids contiguous. Nothing is
/// persisted until the host takes a [`GoalBuilder::snapshot`] and saves it.
#[derive(Debug, Clone)]
pub struct GoalBuilder {
    goal: Goal,
    modules: OrderedList<ModuleDraft>,
    dirty: bool,
}

impl GoalBuilder {
    #[must_use]
    pub fn new(goal: Goal) -> Self {
        Self {
            goal,
            modules: OrderedList::new(),
            dirty: false,
        }
    }

    /// Opens a previously saved tree for editing.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::ForeignModule` if a module points at another goal,
    /// and `BuilderError::Ordering` if siblings share an order id.
    pub fn from_tree(tree: GoalTree) -> Result<Self, BuilderError> {
        let GoalTree { goal, modules } = tree;
        let mut drafts = Vec::with_capacity(modules.len());
        for ModuleTree { module, sections } in modules {
            if module.goal_id() != goal.id() {
                return Err(BuilderError::ForeignModule {
                    module_id: module.id().to_string(),
                    expected: goal.id().to_string(),
                    found: module.goal_id().to_string(),
                });
            }
            drafts.push(ModuleDraft {
                module,
                sections: OrderedList::from_persisted(sections)?,
            });
        }
        Ok(Self {
            goal,
            modules: OrderedList::from_persisted(drafts)?,
            dirty: false,
        })
    }

    #[must_use]
    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    /// True when there are edits not yet handed to [`GoalBuilder::mark_saved`].
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().map(|draft| &draft.module)
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id).map(|draft| &draft.module)
    }

    /// Sections of a module in order.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` for an unknown module.
    pub fn sections(&self, module_id: ModuleId) -> Result<&[Section], BuilderError> {
        Ok(self.draft(module_id)?.sections.as_slice())
    }

    fn draft(&self, id: ModuleId) -> Result<&ModuleDraft, BuilderError> {
        self.modules
            .get(&id)
            .ok_or_else(|| BuilderError::NotFound(id.to_string()))
    }

    fn draft_mut(&mut self, id: ModuleId) -> Result<&mut ModuleDraft, BuilderError> {
        self.modules
            .get_mut(&id)
            .ok_or_else(|| BuilderError::NotFound(id.to_string()))
    }

    fn touched<T>(&mut self, result: Result<T, BuilderError>) -> Result<T, BuilderError> {
        if result.is_ok() {
            self.dirty = true;
        }
        result
    }

    // ─── Goal ──────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `BuilderError::Goal` if the patched goal is invalid.
    pub fn update_goal(&mut self, patch: GoalPatch) -> Result<(), BuilderError> {
        self.goal = self.goal.apply(patch)?;
        self.dirty = true;
        Ok(())
    }

    // ─── Modules ───────────────────────────────────────────────────────────

    /// Adds an empty module titled `New Module {n}`.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::IndexOutOfRange` for a placement past the end.
    pub fn add_module(&mut self, placement: Placement) -> Result<ModuleId, BuilderError> {
        let title = format!("New Module {}", self.modules.len() + 1);
        let module = Module::new(ModuleId::generate(), self.goal.id(), title, None)?;
        self.insert_module(module, placement)
    }

    /// Inserts an already built module (without sections).
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::ForeignModule`, `BuilderError::DuplicateId` or
    /// `BuilderError::IndexOutOfRange`.
    pub fn insert_module(
        &mut self,
        module: Module,
        placement: Placement,
    ) -> Result<ModuleId, BuilderError> {
        if module.goal_id() != self.goal.id() {
            return Err(BuilderError::ForeignModule {
                module_id: module.id().to_string(),
                expected: self.goal.id().to_string(),
                found: module.goal_id().to_string(),
            });
        }
        let id = module.id();
        let draft = ModuleDraft {
            module,
            sections: OrderedList::new(),
        };
        let result = self.modules.insert(draft, placement).map(|_| id);
        self.touched(result)
    }

    /// Removes a module together with its sections.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` for an unknown module.
    pub fn remove_module(&mut self, id: ModuleId) -> Result<(), BuilderError> {
        let result = self.modules.remove(&id).map(|_| ());
        self.touched(result)
    }

    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` or `BuilderError::IndexOutOfRange`.
    pub fn reorder_module(&mut self, id: ModuleId, new_index: usize) -> Result<(), BuilderError> {
        let result = self.modules.reorder(&id, new_index);
        self.touched(result)
    }

    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` or `BuilderError::Module` when the
    /// patched module is invalid.
    pub fn update_module(&mut self, id: ModuleId, patch: ModulePatch) -> Result<(), BuilderError> {
        let result = self.modules.update(&id, |draft| {
            Ok(ModuleDraft {
                module: draft.module.apply(patch)?,
                sections: draft.sections.clone(),
            })
        });
        self.touched(result)
    }

    // ─── Sections ──────────────────────────────────────────────────────────

    /// Adds a section of `kind` with default title and placeholder data.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` or `BuilderError::IndexOutOfRange`.
    pub fn add_section(
        &mut self,
        module_id: ModuleId,
        kind: SectionKind,
        placement: Placement,
    ) -> Result<SectionId, BuilderError> {
        self.insert_section(module_id, Section::draft(kind), placement)
    }

    /// Inserts a prepared section into a module.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound`, `BuilderError::DuplicateId` (the id is
    /// used anywhere in the goal) or `BuilderError::IndexOutOfRange`.
    pub fn insert_section(
        &mut self,
        module_id: ModuleId,
        section: Section,
        placement: Placement,
    ) -> Result<SectionId, BuilderError> {
        let id = section.id().clone();
        if self.locate_section(&id).is_some() {
            return Err(BuilderError::DuplicateId(id.to_string()));
        }
        let result = self
            .draft_mut(module_id)
            .and_then(|draft| draft.sections.insert(section, placement))
            .map(|_| id);
        self.touched(result)
    }

    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` for an unknown module or section.
    pub fn remove_section(
        &mut self,
        module_id: ModuleId,
        section_id: &SectionId,
    ) -> Result<Section, BuilderError> {
        let result = self
            .draft_mut(module_id)
            .and_then(|draft| draft.sections.remove(section_id));
        self.touched(result)
    }

    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` or `BuilderError::IndexOutOfRange`.
    pub fn reorder_section(
        &mut self,
        module_id: ModuleId,
        section_id: &SectionId,
        new_index: usize,
    ) -> Result<(), BuilderError> {
        let result = self
            .draft_mut(module_id)
            .and_then(|draft| draft.sections.reorder(section_id, new_index));
        self.touched(result)
    }

    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` for an unknown module or section.
    pub fn update_section(
        &mut self,
        module_id: ModuleId,
        section_id: &SectionId,
        patch: SectionPatch,
    ) -> Result<(), BuilderError> {
        let result = self.draft_mut(module_id).and_then(|draft| {
            draft
                .sections
                .update(section_id, |section| Ok(patch.apply(section)))
        });
        self.touched(result)
    }

    fn locate_section(&self, id: &SectionId) -> Option<ModuleId> {
        self.modules
            .iter()
            .find(|draft| draft.sections.get(id).is_some())
            .map(|draft| draft.module.id())
    }

    // ─── Save ──────────────────────────────────────────────────────────────

    /// Checks the ordering invariant at every level.
    ///
    /// # Errors
    ///
    /// Returns the first `OrderingInvariantViolation` found.
    pub fn check_invariants(&self) -> Result<(), OrderingInvariantViolation> {
        self.modules.check()?;
        for draft in &self.modules {
            draft.sections.check()?;
        }
        Ok(())
    }

    /// Serializable copy of the whole tree for the explicit save action.
    ///
    /// # Errors
    ///
    /// Returns `OrderingInvariantViolation` if the tree is inconsistent.
    pub fn snapshot(&self) -> Result<GoalTree, OrderingInvariantViolation> {
        self.check_invariants()?;
        Ok(GoalTree {
            goal: self.goal.clone(),
            modules: self
                .modules
                .iter()
                .map(|draft| ModuleTree {
                    module: draft.module.clone(),
                    sections: draft.sections.as_slice().to_vec(),
                })
                .collect(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GoalId, QuizData};

    fn builder() -> GoalBuilder {
        let goal = Goal::new(GoalId::new(1), 6, "Clean Water and Sanitation", None).unwrap();
        GoalBuilder::new(goal)
    }

    fn section_orders(builder: &GoalBuilder, module_id: ModuleId) -> Vec<u32> {
        builder
            .sections(module_id)
            .unwrap()
            .iter()
            .map(Section::order_id)
            .collect()
    }

    #[test]
    fn new_modules_get_numbered_titles() {
        let mut b = builder();
        let first = b.add_module(Placement::End).unwrap();
        let second = b.add_module(Placement::End).unwrap();
        assert_eq!(b.module(first).unwrap().title(), "New Module 1");
        assert_eq!(b.module(second).unwrap().title(), "New Module 2");
        assert_eq!(b.module(second).unwrap().order_id(), 1);
        assert!(b.is_dirty());
    }

    #[test]
    fn add_three_sections_then_remove_middle() {
        let mut b = builder();
        let module = b.add_module(Placement::End).unwrap();
        let a = b.add_section(module, SectionKind::Text, Placement::End).unwrap();
        let mid = b.add_section(module, SectionKind::Quiz, Placement::End).unwrap();
        let c = b.add_section(module, SectionKind::Flashcards, Placement::End).unwrap();
        assert_eq!(section_orders(&b, module), vec![0, 1, 2]);

        b.remove_section(module, &mid).unwrap();
        let ids: Vec<&SectionId> = b.sections(module).unwrap().iter().map(Section::id).collect();
        assert_eq!(ids, vec![&a, &c]);
        assert_eq!(section_orders(&b, module), vec![0, 1]);
    }

    #[test]
    fn reorder_modules_by_drag() {
        let mut b = builder();
        let ids: Vec<ModuleId> = (0..4).map(|_| b.add_module(Placement::End).unwrap()).collect();
        b.reorder_module(ids[2], 0).unwrap();
        let order: Vec<ModuleId> = b.modules().map(Module::id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[1], ids[3]]);
        let order_ids: Vec<u32> = b.modules().map(Module::order_id).collect();
        assert_eq!(order_ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn update_section_keeps_position() {
        let mut b = builder();
        let module = b.add_module(Placement::End).unwrap();
        b.add_section(module, SectionKind::Text, Placement::End).unwrap();
        let quiz = b.add_section(module, SectionKind::Quiz, Placement::End).unwrap();

        let data = SectionData::Quiz(
            QuizData::single(
                "Updated Question?",
                ["Paris", "London", "Rome", "Berlin"],
                "Paris",
            )
            .unwrap(),
        );
        b.update_section(
            module,
            &quiz,
            SectionPatch {
                title: Some("Capitals".into()),
                data: Some(data.clone()),
            },
        )
        .unwrap();

        let section = &b.sections(module).unwrap()[1];
        assert_eq!(section.id(), &quiz);
        assert_eq!(section.order_id(), 1);
        assert_eq!(section.title(), "Capitals");
        assert_eq!(section.data(), &data);
    }

    #[test]
    fn update_module_rejects_blank_title() {
        let mut b = builder();
        let module = b.add_module(Placement::End).unwrap();
        let err = b
            .update_module(
                module,
                ModulePatch {
                    title: Some("  ".into()),
                    subtitle: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BuilderError::Module(_)));
        assert_eq!(b.module(module).unwrap().title(), "New Module 1");
    }

    #[test]
    fn removing_a_module_drops_its_sections() {
        let mut b = builder();
        let keep = b.add_module(Placement::End).unwrap();
        let drop = b.add_module(Placement::At(0)).unwrap();
        b.add_section(drop, SectionKind::Text, Placement::End).unwrap();
        b.remove_module(drop).unwrap();

        let tree = b.snapshot().unwrap();
        assert_eq!(tree.modules.len(), 1);
        assert_eq!(tree.modules[0].module.id(), keep);
        assert_eq!(tree.modules[0].module.order_id(), 0);
        assert_eq!(tree.section_count(), 0);
    }

    #[test]
    fn section_ids_are_unique_across_modules() {
        let mut b = builder();
        let first = b.add_module(Placement::End).unwrap();
        let second = b.add_module(Placement::End).unwrap();
        let section = Section::draft(SectionKind::Text);
        b.insert_section(first, section.clone(), Placement::End).unwrap();
        let err = b
            .insert_section(second, section, Placement::End)
            .unwrap_err();
        assert!(matches!(err, BuilderError::DuplicateId(_)));
    }

    #[test]
    fn snapshot_round_trips_through_from_tree() {
        let mut b = builder();
        let module = b.add_module(Placement::End).unwrap();
        b.add_section(module, SectionKind::Quiz, Placement::End).unwrap();
        b.add_section(module, SectionKind::Text, Placement::At(0)).unwrap();
        let tree = b.snapshot().unwrap();

        let reopened = GoalBuilder::from_tree(tree.clone()).unwrap();
        assert!(!reopened.is_dirty());
        assert_eq!(reopened.snapshot().unwrap(), tree);
    }

    #[test]
    fn from_tree_rejects_foreign_modules() {
        let b = builder();
        let mut tree = b.snapshot().unwrap();
        let stray = Module::new(ModuleId::generate(), GoalId::new(2), "Stray", None).unwrap();
        tree.modules.push(ModuleTree {
            module: stray,
            sections: Vec::new(),
        });
        assert!(matches!(
            GoalBuilder::from_tree(tree).unwrap_err(),
            BuilderError::ForeignModule { .. }
        ));
    }

    #[test]
    fn failed_edits_do_not_mark_dirty() {
        let mut b = builder();
        assert!(b.remove_module(ModuleId::generate()).is_err());
        assert!(!b.is_dirty());
    }
}
