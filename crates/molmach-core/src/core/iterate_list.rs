//! Ordered storage that tolerates removal while it is being walked.
//!
//! The engine's per-tick passes visit entities and compounds in insertion order while the very
//! same pass may dispose of the element being visited, append new elements (a split creating
//! compounds), or leave tombstones behind. [`IterateList`] keeps every element in a stable slot
//! so that removing one never shifts the others, and [`Cursor`] is a detached position rather
//! than a borrow, so the list (and whatever owns it) stays mutable between steps.
//!
//! Tombstoned slots are reclaimed by [`IterateList::compact`], which bumps an epoch. Cursors
//! created before a compaction notice the new epoch and finish instead of visiting the wrong
//! slots.

#[derive(Debug, Clone)]
pub struct IterateList<T> {
    slots: Vec<Option<T>>,
    len: usize,
    epoch: u64,
}

impl<T> Default for IterateList<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            epoch: 0,
        }
    }
}

impl<T: Copy + PartialEq> IterateList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots held, tombstones included.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, value: T) {
        self.slots.push(Some(value));
        self.len += 1;
    }

    pub fn contains(&self, value: &T) -> bool {
        self.iter().any(|v| v == *value)
    }

    /// Removes the first occurrence of `value`, leaving a tombstone.
    pub fn remove(&mut self, value: &T) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.as_ref() == Some(value)) else {
            return false;
        };
        *slot = None;
        self.len -= 1;
        true
    }

    pub fn first(&self) -> Option<T> {
        self.iter().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
        self.epoch += 1;
    }

    /// Drops tombstones. Every outstanding cursor is invalidated.
    pub fn compact(&mut self) {
        if self.slots.len() == self.len {
            return;
        }
        self.slots.retain(Option::is_some);
        self.epoch += 1;
    }

    pub fn cursor(&self) -> Cursor {
        Cursor {
            position: 0,
            current: None,
            epoch: self.epoch,
        }
    }
}

impl<T: Copy + PartialEq> FromIterator<T> for IterateList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        for value in iter {
            list.push(value);
        }
        list
    }
}

/// A position within an [`IterateList`].
#[derive(Debug, Clone)]
pub struct Cursor {
    position: usize,
    current: Option<usize>,
    epoch: u64,
}

impl Cursor {
    /// Advances to the next live element, skipping tombstones. Elements pushed after the cursor
    /// was created are visited too.
    pub fn next<T: Copy + PartialEq>(&mut self, list: &IterateList<T>) -> Option<T> {
        self.current = None;
        if self.epoch != list.epoch {
            return None;
        }

        while self.position < list.slots.len() {
            let index = self.position;
            self.position += 1;
            if let Some(value) = list.slots[index] {
                self.current = Some(index);
                return Some(value);
            }
        }
        None
    }

    /// Removes the element returned by the last call to [`Cursor::next`].
    ///
    /// # Return
    ///
    /// The removed value, or `None` if there is no current element: the cursor has not been
    /// advanced yet, the element was already removed, or the list was compacted meanwhile.
    pub fn remove_current<T: Copy + PartialEq>(&mut self, list: &mut IterateList<T>) -> Option<T> {
        if self.epoch != list.epoch {
            return None;
        }
        let index = self.current.take()?;
        let value = list.slots.get_mut(index)?.take()?;
        list.len -= 1;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(values: &[u32]) -> IterateList<u32> {
        values.iter().copied().collect()
    }

    fn drain(list: &IterateList<u32>) -> Vec<u32> {
        let mut cursor = list.cursor();
        let mut seen = Vec::new();
        while let Some(value) = cursor.next(list) {
            seen.push(value);
        }
        seen
    }

    mod traversal {
        use super::*;

        #[test]
        fn visits_in_insertion_order() {
            let list = list_of(&[1, 2, 3]);
            assert_eq!(drain(&list), vec![1, 2, 3]);
        }

        #[test]
        fn visits_elements_appended_during_the_pass() {
            let mut list = list_of(&[1, 2]);
            let mut cursor = list.cursor();
            let mut seen = Vec::new();
            while let Some(value) = cursor.next(&list) {
                seen.push(value);
                if value == 1 {
                    list.push(10);
                }
            }
            assert_eq!(seen, vec![1, 2, 10]);
        }

        #[test]
        fn empty_list_yields_nothing() {
            let list: IterateList<u32> = IterateList::new();
            assert!(drain(&list).is_empty());
            assert!(list.is_empty());
        }
    }

    mod removal {
        use super::*;

        #[test]
        fn removing_current_keeps_order_of_the_rest() {
            let mut list = list_of(&[1, 2, 3, 4, 5]);
            let mut cursor = list.cursor();
            let mut seen = Vec::new();
            while let Some(value) = cursor.next(&list) {
                seen.push(value);
                if value % 2 == 0 {
                    assert_eq!(cursor.remove_current(&mut list), Some(value));
                }
            }
            assert_eq!(seen, vec![1, 2, 3, 4, 5]);
            assert_eq!(list.to_vec(), vec![1, 3, 5]);
            assert_eq!(list.len(), 3);
        }

        #[test]
        fn removing_every_element_in_one_pass_empties_the_list() {
            let mut list = list_of(&[1, 2, 3]);
            let mut cursor = list.cursor();
            while cursor.next(&list).is_some() {
                cursor.remove_current(&mut list);
            }
            assert!(list.is_empty());
            assert!(drain(&list).is_empty());
        }

        #[test]
        fn removing_twice_at_same_position_is_rejected() {
            let mut list = list_of(&[1, 2]);
            let mut cursor = list.cursor();
            cursor.next(&list);
            assert_eq!(cursor.remove_current(&mut list), Some(1));
            assert_eq!(cursor.remove_current(&mut list), None);
            assert_eq!(list.to_vec(), vec![2]);
        }

        #[test]
        fn removal_through_one_cursor_does_not_disturb_another() {
            let mut list = list_of(&[1, 2, 3]);
            let mut outer = list.cursor();
            let mut inner = list.cursor();

            assert_eq!(outer.next(&list), Some(1));
            assert_eq!(inner.next(&list), Some(1));
            assert_eq!(inner.next(&list), Some(2));
            inner.remove_current(&mut list);

            assert_eq!(outer.next(&list), Some(3));
        }

        #[test]
        fn remove_by_value_leaves_tombstone() {
            let mut list = list_of(&[4, 5, 6]);
            assert!(list.remove(&5));
            assert!(!list.remove(&5));
            assert!(!list.contains(&5));
            assert_eq!(drain(&list), vec![4, 6]);
        }
    }

    mod compaction {
        use super::*;

        #[test]
        fn compact_preserves_order_and_invalidates_cursors() {
            let mut list = list_of(&[1, 2, 3]);
            list.remove(&2);

            let mut stale = list.cursor();
            list.compact();

            assert_eq!(stale.next(&list), None);
            assert_eq!(drain(&list), vec![1, 3]);
        }

        #[test]
        fn compact_reclaims_tombstoned_slots() {
            let mut list = list_of(&[1]);
            for value in 2..100 {
                list.push(value);
                list.remove(&value);
            }
            assert_eq!(list.slot_count(), 99);

            list.compact();
            assert_eq!(list.slot_count(), 1);
            assert_eq!(list.to_vec(), vec![1]);
        }

        #[test]
        fn compact_without_tombstones_keeps_cursors_valid() {
            let mut list = list_of(&[1, 2]);
            let mut cursor = list.cursor();
            list.compact();
            assert_eq!(cursor.next(&list), Some(1));
        }
    }
}
