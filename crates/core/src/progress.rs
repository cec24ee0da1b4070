//! Progress projection.
//!
//! Derives module and goal status from whatever progress records exist.
//! Nothing here is stored; missing records read as `todo`.

use std::collections::HashMap;

use crate::model::{Module, ModuleId, ProgressRecord, ProgressStatus};

/// Per-module status of one learner, built from their progress records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    statuses: HashMap<ModuleId, ProgressStatus>,
}

impl ProgressSnapshot {
    /// Builds a snapshot. Several records for one module merge to the furthest
    /// status.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ProgressRecord>,
    {
        let mut statuses: HashMap<ModuleId, ProgressStatus> = HashMap::new();
        for record in records {
            let entry = statuses.entry(record.module_id).or_default();
            *entry = entry.advance(record.status);
        }
        Self { statuses }
    }

    #[must_use]
    pub fn module_status(&self, id: ModuleId) -> ProgressStatus {
        self.statuses.get(&id).copied().unwrap_or_default()
    }

    /// Goal status over its modules: `done` when all are done, `todo` when
    /// none has started, `doing` otherwise. A goal without modules is `todo`.
    #[must_use]
    pub fn goal_status<'a, I>(&self, modules: I) -> ProgressStatus
    where
        I: IntoIterator<Item = &'a Module>,
    {
        goal_status(modules.into_iter().map(|m| self.module_status(m.id())))
    }

    /// First module in order that is not done yet.
    #[must_use]
    pub fn featured_module<'a>(&self, modules: &'a [Module]) -> Option<&'a Module> {
        modules
            .iter()
            .find(|m| self.module_status(m.id()) != ProgressStatus::Done)
    }

    /// A module is open when it is the first one or its predecessor is done.
    #[must_use]
    pub fn module_unlocked(&self, modules: &[Module], id: ModuleId) -> bool {
        match modules.iter().position(|m| m.id() == id) {
            Some(0) => true,
            Some(index) => self.module_status(modules[index - 1].id()) == ProgressStatus::Done,
            None => false,
        }
    }
}

/// Module that follows `id` in `modules`, used for forward navigation after
/// completion.
#[must_use]
pub fn next_module(modules: &[Module], id: ModuleId) -> Option<&Module> {
    let index = modules.iter().position(|m| m.id() == id)?;
    modules.get(index + 1)
}

/// Folds module statuses into a goal status.
pub fn goal_status<I>(statuses: I) -> ProgressStatus
where
    I: IntoIterator<Item = ProgressStatus>,
{
    let mut any = false;
    let mut all_done = true;
    let mut started = false;
    for status in statuses {
        any = true;
        all_done &= status == ProgressStatus::Done;
        started |= status != ProgressStatus::Todo;
    }
    match (any, all_done, started) {
        (true, true, _) => ProgressStatus::Done,
        (_, _, true) => ProgressStatus::Doing,
        _ => ProgressStatus::Todo,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GoalId, UserId};
    use crate::time::fixed_now;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn modules(n: usize) -> Vec<Module> {
        (0..n)
            .map(|i| {
                Module::new(ModuleId::generate(), GoalId::new(6), format!("Module {i}"), None)
                    .unwrap()
            })
            .collect()
    }

    fn record(module: &Module, status: ProgressStatus) -> ProgressRecord {
        ProgressRecord::new(UserId::new("user123"), module.id(), status, fixed_now())
    }

    #[test]
    fn missing_records_default_to_todo() {
        let mods = modules(2);
        let snapshot = ProgressSnapshot::default();
        assert_eq!(snapshot.module_status(mods[0].id()), ProgressStatus::Todo);
        assert_eq!(snapshot.goal_status(&mods), ProgressStatus::Todo);
    }

    #[test]
    fn goal_is_done_only_when_every_module_is() {
        let mods = modules(3);
        let mut records = vec![
            record(&mods[0], ProgressStatus::Done),
            record(&mods[1], ProgressStatus::Done),
        ];
        let snapshot = ProgressSnapshot::from_records(&records);
        assert_eq!(snapshot.goal_status(&mods), ProgressStatus::Doing);

        records.push(record(&mods[2], ProgressStatus::Done));
        let snapshot = ProgressSnapshot::from_records(&records);
        assert_eq!(snapshot.goal_status(&mods), ProgressStatus::Done);
    }

    #[test]
    fn goal_without_modules_is_todo() {
        assert_eq!(goal_status(std::iter::empty()), ProgressStatus::Todo);
    }

    #[test]
    fn duplicate_records_merge_forward() {
        let mods = modules(1);
        let records = [
            record(&mods[0], ProgressStatus::Done),
            record(&mods[0], ProgressStatus::Doing),
        ];
        let snapshot = ProgressSnapshot::from_records(&records);
        assert_eq!(snapshot.module_status(mods[0].id()), ProgressStatus::Done);
    }

    #[test]
    fn goal_status_matches_definition_for_random_mixes() {
        let all = [ProgressStatus::Todo, ProgressStatus::Doing, ProgressStatus::Done];
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let n = rng.random_range(1..6);
            let statuses: Vec<ProgressStatus> =
                (0..n).map(|_| all[rng.random_range(0..3)]).collect();
            let expected = if statuses.iter().all(|s| *s == ProgressStatus::Done) {
                ProgressStatus::Done
            } else if statuses.iter().all(|s| *s == ProgressStatus::Todo) {
                ProgressStatus::Todo
            } else {
                ProgressStatus::Doing
            };
            assert_eq!(goal_status(statuses), expected, "seed {seed}");
        }
    }

    #[test]
    fn featured_unlocked_and_next() {
        let mods = modules(3);
        let records = [record(&mods[0], ProgressStatus::Done), record(&mods[1], ProgressStatus::Doing)];
        let snapshot = ProgressSnapshot::from_records(&records);

        assert_eq!(snapshot.featured_module(&mods).map(Module::id), Some(mods[1].id()));
        assert!(snapshot.module_unlocked(&mods, mods[0].id()));
        assert!(snapshot.module_unlocked(&mods, mods[1].id()));
        assert!(!snapshot.module_unlocked(&mods, mods[2].id()));
        assert_eq!(next_module(&mods, mods[1].id()).map(Module::id), Some(mods[2].id()));
        assert!(next_module(&mods, mods[2].id()).is_none());
    }
}
