//! Stable-slot arena for stored items.
//!
//! Removing an entry never renumbers the others, so a slot id held by the
//! gameplay layer (or carried by a replicated operation) keeps pointing at
//! the same item until that item is removed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable handle of an item inside a storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SlotId(pub u32);

impl SlotId {
    /// Position in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena with free-slot reuse.
///
/// Allocation always takes the lowest vacant slot, and trailing vacancies are
/// trimmed, so the layout is a pure function of which slots are occupied.
/// Two replicas holding the same entries therefore allocate identically.
#[derive(Debug, Clone)]
pub struct Slots<T> {
    entries: Vec<Option<T>>,
    vacant: BTreeSet<u32>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            vacant: BTreeSet::new(),
        }
    }
}

impl<T> Slots<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an arena from its raw layout (vacancies as `None`).
    pub fn from_entries(entries: Vec<Option<T>>) -> Self {
        let mut slots = Self {
            vacant: entries
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.is_none())
                .map(|(i, _)| i as u32)
                .collect(),
            entries,
        };
        slots.trim();
        slots
    }

    /// Slot the next [`Slots::insert`] will use.
    pub fn next_slot(&self) -> SlotId {
        match self.vacant.first() {
            Some(&slot) => SlotId(slot),
            None => SlotId(self.entries.len() as u32),
        }
    }

    /// Store a value, returning its slot.
    pub fn insert(&mut self, value: T) -> SlotId {
        let slot = self.next_slot();
        if self.vacant.remove(&slot.0) {
            self.entries[slot.index()] = Some(value);
        } else {
            self.entries.push(Some(value));
        }
        slot
    }

    /// Remove and return the value at `slot`.
    pub fn remove(&mut self, slot: SlotId) -> Option<T> {
        let value = self.entries.get_mut(slot.index())?.take()?;
        self.vacant.insert(slot.0);
        self.trim();
        Some(value)
    }

    fn trim(&mut self) {
        while let Some(None) = self.entries.last() {
            self.entries.pop();
            self.vacant.remove(&(self.entries.len() as u32));
        }
    }

    /// Borrow the value at `slot`.
    pub fn get(&self, slot: SlotId) -> Option<&T> {
        self.entries.get(slot.index())?.as_ref()
    }

    /// Mutably borrow the value at `slot`.
    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut T> {
        self.entries.get_mut(slot.index())?.as_mut()
    }

    /// True when `slot` holds a value.
    pub fn contains(&self, slot: SlotId) -> bool {
        self.get(slot).is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.len() - self.vacant.len()
    }

    /// True when no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the raw layout, vacancies included.
    pub fn slot_count(&self) -> usize {
        self.entries.len()
    }

    /// Raw layout, vacancies as `None`.
    pub fn entries(&self) -> &[Option<T>] {
        &self.entries
    }

    /// Occupied slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| entry.as_ref().map(|value| (SlotId(i as u32), value)))
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.vacant.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_keeps_other_slots_stable() {
        let mut slots = Slots::new();
        let a = slots.insert('a');
        let b = slots.insert('b');
        let c = slots.insert('c');

        assert_eq!(slots.remove(a), Some('a'));
        assert_eq!(slots.get(b), Some(&'b'));
        assert_eq!(slots.get(c), Some(&'c'));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots.slot_count(), 3);
    }

    #[test]
    fn reuses_lowest_vacant_slot() {
        let mut slots = Slots::new();
        for value in 0..5 {
            slots.insert(value);
        }
        slots.remove(SlotId(3));
        slots.remove(SlotId(1));
        assert_eq!(slots.next_slot(), SlotId(1));
        assert_eq!(slots.insert(10), SlotId(1));
        assert_eq!(slots.insert(11), SlotId(3));
        assert_eq!(slots.insert(12), SlotId(5));
    }

    #[test]
    fn trailing_vacancies_are_trimmed() {
        let mut slots = Slots::new();
        let a = slots.insert(1);
        let b = slots.insert(2);
        slots.remove(a);
        slots.remove(b);
        assert_eq!(slots.slot_count(), 0);
        assert!(slots.is_empty());
        assert_eq!(slots.insert(3), SlotId(0));
    }

    #[test]
    fn double_remove_is_none() {
        let mut slots = Slots::new();
        let a = slots.insert(1);
        slots.insert(2);
        assert!(slots.remove(a).is_some());
        assert!(slots.remove(a).is_none());
        assert!(slots.remove(SlotId(42)).is_none());
    }

    #[test]
    fn rebuilt_layout_allocates_like_the_original() {
        let mut original = Slots::new();
        for value in 0..4 {
            original.insert(value);
        }
        original.remove(SlotId(2));
        original.remove(SlotId(0));

        let mut rebuilt = Slots::from_entries(original.entries().to_vec());
        assert_eq!(rebuilt.len(), original.len());
        assert_eq!(rebuilt.insert(9), original.insert(9));
        assert_eq!(rebuilt.insert(9), original.insert(9));
        assert_eq!(rebuilt.entries(), original.entries());
    }

    #[test]
    fn from_entries_trims_trailing_vacancies() {
        let slots = Slots::from_entries(vec![Some(1), None, None]);
        assert_eq!(slots.slot_count(), 1);
        assert_eq!(slots.next_slot(), SlotId(1));
    }
}
