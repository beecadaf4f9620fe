//! Read-only cursors and in-order iteration.
//!
//! An [`Entry`] borrows the index immutably, so the tree cannot be
//! restructured while a cursor is alive and node positions stay valid.

use std::fmt;
use std::iter::FusedIterator;

use crate::tree::{BlockIndex, NodeId};

/// A cursor positioned on one node of a [`BlockIndex`].
pub struct Entry<'a, V> {
    index: &'a BlockIndex<V>,
    id: NodeId,
}

impl<V> Clone for Entry<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Entry<'_, V> {}

impl<'a, V> Entry<'a, V> {
    pub(crate) fn new(index: &'a BlockIndex<V>, id: NodeId) -> Self {
        Self { index, id }
    }

    /// The entry's key.
    pub fn key(&self) -> i64 {
        self.index.node(self.id).key
    }

    /// The entry's value.
    pub fn value(&self) -> &'a V {
        &self.index.node(self.id).value
    }

    /// Byte size recorded with the value.
    pub fn data_size(&self) -> usize {
        self.index.node(self.id).data_size
    }

    /// The entry with the next larger key.
    pub fn next(&self) -> Option<Entry<'a, V>> {
        self.index.next_id(self.id).map(|id| Entry::new(self.index, id))
    }

    /// The entry with the next smaller key.
    pub fn previous(&self) -> Option<Entry<'a, V>> {
        self.index
            .previous_id(self.id)
            .map(|id| Entry::new(self.index, id))
    }
}

impl<V: fmt::Debug> fmt::Debug for Entry<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key())
            .field("value", self.value())
            .field("data_size", &self.data_size())
            .finish()
    }
}

/// In-order iterator over a [`BlockIndex`], yielding `(key, &value)`.
///
/// Walks successor links from both ends and stops when they meet, so it
/// is exact-size and double-ended.
pub struct Iter<'a, V> {
    index: &'a BlockIndex<V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(
        index: &'a BlockIndex<V>,
        front: Option<NodeId>,
        back: Option<NodeId>,
        remaining: usize,
    ) -> Self {
        Self {
            index,
            front,
            back,
            remaining,
        }
    }

    fn item(&self, id: NodeId) -> (i64, &'a V) {
        let node = self.index.node(id);
        (node.key, &node.value)
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (i64, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.index.next_id(id);
        Some(self.item(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> DoubleEndedIterator for Iter<'_, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.index.previous_id(id);
        Some(self.item(id))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

#[cfg(test)]
mod tests {
    use crate::BlockIndex;

    fn index_of(keys: &[i64]) -> BlockIndex<i64> {
        let mut index = BlockIndex::new();
        for &k in keys {
            index.put(k, k * 10, 8).unwrap();
        }
        index
    }

    #[test]
    fn walk_forward_from_first_to_last() {
        let index = index_of(&[40, 10, 30, 20, 50]);
        let mut keys = Vec::new();
        let mut cur = index.first();
        while let Some(e) = cur {
            keys.push(e.key());
            cur = e.next();
        }
        assert_eq!(keys, vec![10, 20, 30, 40, 50]);
        assert_eq!(index.last().unwrap().key(), 50);
    }

    #[test]
    fn walk_backward_from_last_to_first() {
        let index = index_of(&[3, 1, 2, 5, 4]);
        let mut keys = Vec::new();
        let mut cur = index.last();
        while let Some(e) = cur {
            keys.push(e.key());
            cur = e.previous();
        }
        assert_eq!(keys, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn entry_exposes_value_and_size() {
        let index = index_of(&[7]);
        let e = index.entry(7).unwrap();
        assert_eq!(*e.value(), 70);
        assert_eq!(e.data_size(), 8);
        assert!(e.next().is_none());
        assert!(e.previous().is_none());
        assert!(index.entry(8).is_none());
    }

    #[test]
    fn iter_meets_in_the_middle() {
        let index = index_of(&[1, 2, 3, 4, 5]);
        let mut it = index.iter();
        assert_eq!(it.len(), 5);
        assert_eq!(it.next().map(|(k, _)| k), Some(1));
        assert_eq!(it.next_back().map(|(k, _)| k), Some(5));
        assert_eq!(it.next().map(|(k, _)| k), Some(2));
        assert_eq!(it.next_back().map(|(k, _)| k), Some(4));
        assert_eq!(it.next().map(|(k, _)| k), Some(3));
        assert_eq!(it.next(), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn rev_iterates_descending() {
        let index = index_of(&[9, 3, 6]);
        let keys: Vec<i64> = index.iter().rev().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![9, 6, 3]);
    }
}
