use std::fmt;
use thiserror::Error;

use super::BuilderError;

/// An item that lives at an `order_id` among its siblings.
pub trait Ordered {
    type Id: Clone + Eq + fmt::Display;

    fn id(&self) -> Self::Id;
    fn order_id(&self) -> u32;
    fn set_order_id(&mut self, order_id: u32);
}

/// Sibling order ids are not exactly `0..n`.
///
/// The engine never produces this; seeing it means a bug or corrupt data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderingInvariantViolation {
    #[error("order id {order_id} is shared by more than one sibling")]
    Duplicate { order_id: u32 },

    #[error("expected order id {expected}, found {found}")]
    Gap { expected: u32, found: u32 },

    #[error("too many siblings to number: {len}")]
    Overflow { len: usize },
}

/// Where `insert` puts a new item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    End,
    At(usize),
}

/// Ordered siblings with contiguous, zero-based `order_id`s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedList<T> {
    items: Vec<T>,
}

impl<T> Default for OrderedList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Ordered> OrderedList<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads siblings read from storage.
    ///
    /// Items are sorted by `order_id`; gaps left by an external writer are
    /// compacted, shared order ids are rejected.
    ///
    /// # Errors
    ///
    /// Returns `OrderingInvariantViolation::Duplicate` when two items claim the
    /// same position.
    pub fn from_persisted(mut items: Vec<T>) -> Result<Self, OrderingInvariantViolation> {
        items.sort_by_key(|item| item.order_id());
        if let Some(pair) = items
            .windows(2)
            .find(|pair| pair[0].order_id() == pair[1].order_id())
        {
            return Err(OrderingInvariantViolation::Duplicate {
                order_id: pair[0].order_id(),
            });
        }
        let mut list = Self { items };
        list.renumber()?;
        Ok(list)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    #[must_use]
    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == *id)
    }

    #[must_use]
    pub fn position(&self, id: &T::Id) -> Option<usize> {
        self.items.iter().position(|item| item.id() == *id)
    }

    fn index_of(&self, id: &T::Id) -> Result<usize, BuilderError> {
        self.position(id)
            .ok_or_else(|| BuilderError::NotFound(id.to_string()))
    }

    /// Inserts `item` and shifts later siblings down by one.
    ///
    /// Returns the index the item landed at.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::DuplicateId` if the id is already present and
    /// `BuilderError::IndexOutOfRange` if `At(index)` is past the end.
    pub fn insert(&mut self, item: T, placement: Placement) -> Result<usize, BuilderError> {
        if self.position(&item.id()).is_some() {
            return Err(BuilderError::DuplicateId(item.id().to_string()));
        }
        let index = match placement {
            Placement::End => self.items.len(),
            Placement::At(index) if index <= self.items.len() => index,
            Placement::At(index) => {
                return Err(BuilderError::IndexOutOfRange {
                    index,
                    len: self.items.len(),
                });
            }
        };
        self.items.insert(index, item);
        self.renumber()?;
        Ok(index)
    }

    /// Removes the item and compacts the remaining order ids.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` for an unknown id.
    pub fn remove(&mut self, id: &T::Id) -> Result<T, BuilderError> {
        let index = self.index_of(id)?;
        let removed = self.items.remove(index);
        self.renumber()?;
        Ok(removed)
    }

    /// Moves the item to `new_index` by removing and reinserting it, then
    /// renumbers every sibling in one pass.
    ///
    /// Moving an item to its current index leaves the list unchanged.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound` for an unknown id and
    /// `BuilderError::IndexOutOfRange` if `new_index >= len`.
    pub fn reorder(&mut self, id: &T::Id, new_index: usize) -> Result<(), BuilderError> {
        let from = self.index_of(id)?;
        if new_index >= self.items.len() {
            return Err(BuilderError::IndexOutOfRange {
                index: new_index,
                len: self.items.len(),
            });
        }
        if from == new_index {
            return Ok(());
        }
        let item = self.items.remove(from);
        self.items.insert(new_index, item);
        self.renumber()?;
        Ok(())
    }

    /// Replaces the item with the result of `edit`, keeping its id and position.
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::NotFound`, `BuilderError::IdChanged`, or whatever
    /// `edit` returns.
    pub fn update<F>(&mut self, id: &T::Id, edit: F) -> Result<(), BuilderError>
    where
        F: FnOnce(&T) -> Result<T, BuilderError>,
    {
        let index = self.index_of(id)?;
        let mut next = edit(&self.items[index])?;
        if next.id() != *id {
            return Err(BuilderError::IdChanged(id.to_string()));
        }
        next.set_order_id(self.items[index].order_id());
        self.items[index] = next;
        Ok(())
    }

    /// Verifies that order ids are exactly `0..n` in list order.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check(&self) -> Result<(), OrderingInvariantViolation> {
        let mut seen = std::collections::BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.order_id()) {
                return Err(OrderingInvariantViolation::Duplicate {
                    order_id: item.order_id(),
                });
            }
        }
        for (expected, item) in self.items.iter().enumerate() {
            let expected = u32::try_from(expected).map_err(|_| OrderingInvariantViolation::Overflow {
                len: self.items.len(),
            })?;
            if item.order_id() != expected {
                return Err(OrderingInvariantViolation::Gap {
                    expected,
                    found: item.order_id(),
                });
            }
        }
        Ok(())
    }

    fn renumber(&mut self) -> Result<(), OrderingInvariantViolation> {
        let len = self.items.len();
        for (index, item) in self.items.iter_mut().enumerate() {
            let order_id =
                u32::try_from(index).map_err(|_| OrderingInvariantViolation::Overflow { len })?;
            item.set_order_id(order_id);
        }
        debug_assert!(self.check().is_ok());
        Ok(())
    }
}

impl<'a, T> IntoIterator for &'a OrderedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: u32,
        order_id: u32,
    }

    impl Item {
        fn new(id: u32) -> Self {
            Self { id, order_id: 0 }
        }
    }

    impl Ordered for Item {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn order_id(&self) -> u32 {
            self.order_id
        }

        fn set_order_id(&mut self, order_id: u32) {
            self.order_id = order_id;
        }
    }

    fn list_of(ids: &[u32]) -> OrderedList<Item> {
        let mut list = OrderedList::new();
        for id in ids {
            list.insert(Item::new(*id), Placement::End).unwrap();
        }
        list
    }

    fn ids(list: &OrderedList<Item>) -> Vec<u32> {
        list.iter().map(|item| item.id).collect()
    }

    fn order_ids(list: &OrderedList<Item>) -> Vec<u32> {
        list.iter().map(|item| item.order_id).collect()
    }

    #[test]
    fn insert_three_remove_middle_compacts() {
        let mut list = list_of(&[10, 11, 12]);
        assert_eq!(order_ids(&list), vec![0, 1, 2]);

        list.remove(&11).unwrap();
        assert_eq!(ids(&list), vec![10, 12]);
        assert_eq!(order_ids(&list), vec![0, 1]);
    }

    #[test]
    fn drag_index_two_to_front() {
        let mut list = list_of(&[0, 1, 2, 3]);
        list.reorder(&2, 0).unwrap();
        assert_eq!(ids(&list), vec![2, 0, 1, 3]);
        assert_eq!(order_ids(&list), vec![0, 1, 2, 3]);
    }

    #[test]
    fn moves_across_non_adjacent_positions() {
        let mut list = list_of(&[0, 1, 2, 3, 4]);
        list.reorder(&0, 4).unwrap();
        assert_eq!(ids(&list), vec![1, 2, 3, 4, 0]);
        list.reorder(&3, 1).unwrap();
        assert_eq!(ids(&list), vec![1, 3, 2, 4, 0]);
        assert!(list.check().is_ok());
    }

    #[test]
    fn reorder_to_own_index_is_a_no_op() {
        let mut list = list_of(&[5, 6, 7]);
        let before = list.clone();
        list.reorder(&6, 1).unwrap();
        assert_eq!(list, before);
    }

    #[test]
    fn insert_at_index_shifts_later_siblings() {
        let mut list = list_of(&[1, 2, 3]);
        let index = list.insert(Item::new(9), Placement::At(1)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(ids(&list), vec![1, 9, 2, 3]);
        assert_eq!(order_ids(&list), vec![0, 1, 2, 3]);
    }

    #[test]
    fn rejects_bad_ids_and_indexes() {
        let mut list = list_of(&[1, 2]);
        assert_eq!(
            list.insert(Item::new(1), Placement::End).unwrap_err(),
            BuilderError::DuplicateId("1".into())
        );
        assert_eq!(
            list.insert(Item::new(3), Placement::At(3)).unwrap_err(),
            BuilderError::IndexOutOfRange { index: 3, len: 2 }
        );
        assert_eq!(
            list.reorder(&1, 2).unwrap_err(),
            BuilderError::IndexOutOfRange { index: 2, len: 2 }
        );
        assert_eq!(
            list.remove(&42).unwrap_err(),
            BuilderError::NotFound("42".into())
        );
    }

    #[test]
    fn update_keeps_id_and_position() {
        let mut list = list_of(&[1, 2]);
        list.update(&2, |item| {
            Ok(Item {
                id: item.id,
                order_id: 99,
            })
        })
        .unwrap();
        assert_eq!(order_ids(&list), vec![0, 1]);

        let err = list
            .update(&2, |_| Ok(Item::new(7)))
            .unwrap_err();
        assert_eq!(err, BuilderError::IdChanged("2".into()));
    }

    #[test]
    fn from_persisted_sorts_and_compacts_gaps() {
        let items = vec![
            Item { id: 1, order_id: 7 },
            Item { id: 2, order_id: 2 },
            Item { id: 3, order_id: 4 },
        ];
        let list = OrderedList::from_persisted(items).unwrap();
        assert_eq!(ids(&list), vec![2, 3, 1]);
        assert_eq!(order_ids(&list), vec![0, 1, 2]);
    }

    #[test]
    fn from_persisted_rejects_duplicates() {
        let items = vec![Item { id: 1, order_id: 0 }, Item { id: 2, order_id: 0 }];
        assert_eq!(
            OrderedList::from_persisted(items).unwrap_err(),
            OrderingInvariantViolation::Duplicate { order_id: 0 }
        );
    }

    #[test]
    fn check_reports_gaps() {
        let list = OrderedList {
            items: vec![Item { id: 1, order_id: 0 }, Item { id: 2, order_id: 2 }],
        };
        assert_eq!(
            list.check().unwrap_err(),
            OrderingInvariantViolation::Gap {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn random_edit_sequences_keep_order_ids_contiguous() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut list = OrderedList::new();
            let mut model: Vec<u32> = Vec::new();
            let mut next_id = 0u32;

            for _ in 0..200 {
                match rng.random_range(0..3) {
                    0 => {
                        let index = rng.random_range(0..=model.len());
                        list.insert(Item::new(next_id), Placement::At(index)).unwrap();
                        model.insert(index, next_id);
                        next_id += 1;
                    }
                    1 if !model.is_empty() => {
                        let id = model.remove(rng.random_range(0..model.len()));
                        list.remove(&id).unwrap();
                    }
                    2 if !model.is_empty() => {
                        let from = rng.random_range(0..model.len());
                        let to = rng.random_range(0..model.len());
                        let id = model.remove(from);
                        model.insert(to, id);
                        list.reorder(&id, to).unwrap();
                    }
                    _ => {}
                }

                assert!(list.check().is_ok(), "seed {seed}");
                assert_eq!(ids(&list), model, "seed {seed}");
                let expected: Vec<u32> = (0..u32::try_from(model.len()).unwrap()).collect();
                assert_eq!(order_ids(&list), expected, "seed {seed}");
            }
        }
    }
}
