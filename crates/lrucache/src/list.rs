//! Recency list backed by a slot arena
//!
//! Links are slot indices rather than pointers. Slots [`HEAD`] and [`TAIL`]
//! are permanent sentinels, so linking never has to special-case the ends.
//! Vacated slots go on a free list and are handed out again before the arena
//! grows.

use std::iter::FusedIterator;

use crate::error::InvariantError;

/// Head sentinel: `slots[HEAD].next` is the most recently used entry
pub(crate) const HEAD: usize = 0;

/// Tail sentinel: `slots[TAIL].prev` is the least recently used entry
pub(crate) const TAIL: usize = 1;

/// Upper bound on entries reserved up front; larger caches grow on demand
pub(crate) const MAX_PREALLOC: usize = 1024;

struct Entry<K, V> {
    key: K,
    value: V,
}

struct Slot<K, V> {
    entry: Option<Entry<K, V>>,
    prev: usize,
    next: usize,
}

impl<K, V> Slot<K, V> {
    fn vacant() -> Self {
        Self {
            entry: None,
            prev: HEAD,
            next: TAIL,
        }
    }
}

/// Doubly-linked list of entries ordered MRU (front) to LRU (back)
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Slot<K, V>>,
    free_list: Vec<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    /// Create an empty list, reserving room for up to [`MAX_PREALLOC`] entries
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.min(MAX_PREALLOC) + 2);
        slots.push(Slot::vacant());
        slots.push(Slot::vacant());

        Self {
            slots,
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Handle of the most recently used entry
    pub(crate) fn front(&self) -> Option<usize> {
        let idx = self.slots[HEAD].next;
        (idx != TAIL).then_some(idx)
    }

    /// Handle of the least recently used entry
    pub(crate) fn back(&self) -> Option<usize> {
        let idx = self.slots[TAIL].prev;
        (idx != HEAD).then_some(idx)
    }

    pub(crate) fn get(&self, idx: usize) -> Option<(&K, &V)> {
        self.slots
            .get(idx)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| (&entry.key, &entry.value))
    }

    pub(crate) fn value(&self, idx: usize) -> Option<&V> {
        self.get(idx).map(|(_, value)| value)
    }

    pub(crate) fn value_mut(&mut self, idx: usize) -> Option<&mut V> {
        self.slots
            .get_mut(idx)
            .and_then(|slot| slot.entry.as_mut())
            .map(|entry| &mut entry.value)
    }

    /// Insert a new entry right after the head sentinel and return its handle
    pub(crate) fn push_front(&mut self, key: K, value: V) -> usize {
        let idx = self.alloc();
        self.slots[idx].entry = Some(Entry { key, value });
        self.link_front(idx);
        self.len += 1;
        idx
    }

    /// Promote an occupied slot to most recently used
    pub(crate) fn move_to_front(&mut self, idx: usize) {
        if self.slots[HEAD].next == idx {
            return;
        }

        self.unlink(idx);
        self.link_front(idx);
    }

    /// Unlink an occupied slot and free it, returning its entry
    pub(crate) fn remove(&mut self, idx: usize) -> Option<(K, V)> {
        if idx == HEAD || idx == TAIL {
            return None;
        }

        let entry = self.slots.get_mut(idx)?.entry.take()?;
        self.unlink(idx);
        self.free_list.push(idx);
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    /// Remove the least recently used entry
    pub(crate) fn pop_back(&mut self) -> Option<(K, V)> {
        let idx = self.back()?;
        self.remove(idx)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.truncate(2);
        self.slots[HEAD] = Slot::vacant();
        self.slots[TAIL] = Slot::vacant();
        self.free_list.clear();
        self.len = 0;
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            front: self.slots[HEAD].next,
            back: self.slots[TAIL].prev,
            remaining: self.len,
        }
    }

    /// Walk the whole arena and confirm the links describe one chain
    pub(crate) fn check(&self) -> Result<(), InvariantError> {
        for sentinel in [HEAD, TAIL] {
            if self.slots[sentinel].entry.is_some() {
                return Err(InvariantError::new(format!(
                    "sentinel slot {sentinel} holds an entry"
                )));
            }
        }

        let mut count = 0;
        let mut cur = HEAD;
        while cur != TAIL {
            let next = self.slots[cur].next;
            if next >= self.slots.len() {
                return Err(InvariantError::new(format!(
                    "slot {cur} links to out-of-bounds slot {next}"
                )));
            }
            if self.slots[next].prev != cur {
                return Err(InvariantError::new(format!(
                    "slot {next}.prev is {} but slot {cur}.next points at it",
                    self.slots[next].prev
                )));
            }
            if next != TAIL {
                if self.slots[next].entry.is_none() {
                    return Err(InvariantError::new(format!("linked slot {next} is vacant")));
                }
                count += 1;
                if count > self.len {
                    return Err(InvariantError::new(format!(
                        "chain is longer than recorded length {}",
                        self.len
                    )));
                }
            }
            cur = next;
        }

        if count != self.len {
            return Err(InvariantError::new(format!(
                "chain holds {count} entries but recorded length is {}",
                self.len
            )));
        }

        for &idx in &self.free_list {
            if self.slots[idx].entry.is_some() {
                return Err(InvariantError::new(format!("free slot {idx} holds an entry")));
            }
        }

        let occupied = self.slots.iter().filter(|slot| slot.entry.is_some()).count();
        if occupied != self.len {
            return Err(InvariantError::new(format!(
                "{occupied} occupied slots but recorded length is {}",
                self.len
            )));
        }

        Ok(())
    }

    fn alloc(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            self.slots.push(Slot::vacant());
            self.slots.len() - 1
        }
    }

    fn link_front(&mut self, idx: usize) {
        let first = self.slots[HEAD].next;
        self.slots[idx].prev = HEAD;
        self.slots[idx].next = first;
        self.slots[first].prev = idx;
        self.slots[HEAD].next = idx;
    }

    fn unlink(&mut self, idx: usize) {
        let Slot { prev, next, .. } = self.slots[idx];
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
        self.slots[idx].prev = HEAD;
        self.slots[idx].next = TAIL;
    }
}

/// Iterator over `(&K, &V)` from most to least recently used
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front;
        self.front = self.list.slots[idx].next;
        self.remaining -= 1;
        self.list.get(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back;
        self.back = self.list.slots[idx].prev;
        self.remaining -= 1;
        self.list.get(idx)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
