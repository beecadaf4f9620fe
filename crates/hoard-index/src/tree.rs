//! The left-leaning red-black tree.
//!
//! Insertion and deletion follow the top-down LLRB scheme: insertion adds
//! a red leaf and repairs right-leaning or doubled red links on the way
//! back up; deletion pushes a red link down the search path
//! (`move_red_left` / `move_red_right`) so the target can always be
//! detached from a 3- or 4-node, then `balance`s every node on the path
//! back to the root.

use std::mem;

use crate::cursor::{Entry, Iter};
use crate::error::{IndexError, InvariantViolation};

/// Reserved key meaning "no such key". Never stored in the index.
pub const NULL_KEY: i64 = i64::MIN;

/// Slot index of a node.
pub(crate) type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    fn flipped(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

pub(crate) struct Node<V> {
    pub(crate) key: i64,
    pub(crate) value: V,
    /// Byte size recorded alongside the value by `put`.
    pub(crate) data_size: usize,
    pub(crate) color: Color,
    /// Number of nodes in the subtree rooted here, this node included.
    pub(crate) count: usize,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

/// An ordered map from `i64` keys to values, balanced as a left-leaning
/// red-black tree.
///
/// Lookups, insertions and removals are O(log n); [`len`](Self::len) is
/// O(1) because every node carries its subtree count. Each value is
/// stored with a caller-supplied byte size, reported by
/// [`data_size`](Self::data_size).
///
/// Nodes live in a slot vector; vacated slots are recycled through a free
/// list, so a long-lived index does not grow with churn.
pub struct BlockIndex<V> {
    slots: Vec<Option<Node<V>>>,
    free_list: Vec<NodeId>,
    root: Option<NodeId>,
}

impl<V> Default for BlockIndex<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> BlockIndex<V> {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            root: None,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.count(self.root)
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Value stored under `key`.
    pub fn get(&self, key: i64) -> Option<&V> {
        self.find(key).map(|id| &self.node(id).value)
    }

    /// Mutable value stored under `key`.
    ///
    /// The recorded byte size is left untouched.
    pub fn get_mut(&mut self, key: i64) -> Option<&mut V> {
        let id = self.find(key)?;
        Some(&mut self.node_mut(id).value)
    }

    /// Whether an entry exists under `key`.
    pub fn contains_key(&self, key: i64) -> bool {
        self.find(key).is_some()
    }

    /// Byte size recorded with the value under `key`.
    pub fn data_size(&self, key: i64) -> Result<usize, IndexError> {
        self.find(key)
            .map(|id| self.node(id).data_size)
            .ok_or(IndexError::NotFound { key })
    }

    /// Cursor positioned on `key`, for stepping to its neighbours.
    pub fn entry(&self, key: i64) -> Option<Entry<'_, V>> {
        self.find(key).map(|id| Entry::new(self, id))
    }

    /// Entry with the smallest key.
    pub fn first(&self) -> Option<Entry<'_, V>> {
        self.first_id().map(|id| Entry::new(self, id))
    }

    /// Entry with the largest key.
    pub fn last(&self) -> Option<Entry<'_, V>> {
        self.last_id().map(|id| Entry::new(self, id))
    }

    /// In-order iterator over `(key, &value)` pairs.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self, self.first_id(), self.last_id(), self.len())
    }

    /// Ordered copy of every `(key, value)` pair.
    ///
    /// The result is independent of the index: later mutation does not
    /// affect it.
    pub fn snapshot(&self) -> Vec<(i64, V)>
    where
        V: Clone,
    {
        self.iter().map(|(k, v)| (k, v.clone())).collect()
    }

    /// Insert `value` under `key`, or replace the existing value.
    ///
    /// Returns the previous value when `key` was already present, in which
    /// case the recorded byte size is updated to `data_size`. A new key is
    /// added as a red leaf and rebalanced into place.
    pub fn put(&mut self, key: i64, value: V, data_size: usize) -> Result<Option<V>, IndexError> {
        if key == NULL_KEY {
            return Err(IndexError::ReservedKey);
        }
        if let Some(id) = self.find(key) {
            let node = self.node_mut(id);
            node.data_size = data_size;
            return Ok(Some(mem::replace(&mut node.value, value)));
        }

        let leaf = self.alloc_node(key, value, data_size);
        let root = self.insert(self.root, leaf);
        self.set_root(Some(root));
        Ok(None)
    }

    /// Remove the entry under `key` and return its value.
    ///
    /// Leaves the tree untouched when `key` is absent.
    pub fn remove(&mut self, key: i64) -> Option<V> {
        self.find(key)?;
        let root = self.root?;
        if !self.is_red(self.left(root)) && !self.is_red(self.right(root)) {
            self.node_mut(root).color = Color::Red;
        }
        let (root, removed) = self.remove_node(root, key);
        self.set_root(root);
        Some(self.release(removed))
    }

    /// Remove every entry, passing each value to `destructor`.
    ///
    /// Nodes are torn down one at a time; each node's links are cleared
    /// before its value is handed over and its slot released.
    pub fn clear_with<F>(&mut self, mut destructor: F)
    where
        F: FnMut(V),
    {
        let mut pending: Vec<NodeId> = self.root.into_iter().collect();
        self.root = None;
        while let Some(id) = pending.pop() {
            let Some(mut node) = self.slots[id].take() else {
                continue;
            };
            pending.extend(node.left.take());
            pending.extend(node.right.take());
            node.parent = None;
            node.count = 0;
            destructor(node.value);
        }
        self.slots.clear();
        self.free_list.clear();
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.clear_with(drop);
    }

    /// Verify ordering, links, counts and every red-black invariant.
    ///
    /// O(n). Intended for tests and debug assertions.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        crate::validate::check(self)
    }

    // ── Slot management ─────────────────────────────────────────────

    fn alloc_node(&mut self, key: i64, value: V, data_size: usize) -> NodeId {
        let node = Node {
            key,
            value,
            data_size,
            color: Color::Red,
            count: 1,
            left: None,
            right: None,
            parent: None,
        };
        if let Some(id) = self.free_list.pop() {
            self.slots[id] = Some(node);
            id
        } else {
            self.slots.push(Some(node));
            self.slots.len() - 1
        }
    }

    /// Vacate a detached node's slot and hand back its value.
    fn release(&mut self, id: NodeId) -> V {
        let mut node = self.slots[id]
            .take()
            .expect("released node must occupy its slot");
        node.left = None;
        node.right = None;
        node.parent = None;
        self.free_list.push(id);
        node.value
    }

    pub(crate) fn slot(&self, id: NodeId) -> Option<&Node<V>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<V> {
        self.slot(id).expect("linked node must occupy its slot")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        self.slots[id]
            .as_mut()
            .expect("linked node must occupy its slot")
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
        if let Some(r) = root {
            let node = self.node_mut(r);
            node.parent = None;
            node.color = Color::Black;
        }
    }

    // ── Navigation ──────────────────────────────────────────────────

    fn find(&self, key: i64) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            cur = match key.cmp(&node.key) {
                std::cmp::Ordering::Equal => return Some(id),
                std::cmp::Ordering::Less => node.left,
                std::cmp::Ordering::Greater => node.right,
            };
        }
        None
    }

    fn first_id(&self) -> Option<NodeId> {
        self.root.map(|r| self.leftmost(r))
    }

    fn last_id(&self) -> Option<NodeId> {
        self.root.map(|r| self.rightmost(r))
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.left(id) {
            id = l;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(r) = self.right(id) {
            id = r;
        }
        id
    }

    /// In-order successor: down the right subtree, or up to the first
    /// ancestor reached from its left side.
    pub(crate) fn next_id(&self, id: NodeId) -> Option<NodeId> {
        if let Some(r) = self.right(id) {
            return Some(self.leftmost(r));
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while let Some(p) = parent {
            if self.left(p) == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.node(p).parent;
        }
        None
    }

    /// In-order predecessor; mirror image of [`Self::next_id`].
    pub(crate) fn previous_id(&self, id: NodeId) -> Option<NodeId> {
        if let Some(l) = self.left(id) {
            return Some(self.rightmost(l));
        }
        let mut child = id;
        let mut parent = self.node(id).parent;
        while let Some(p) = parent {
            if self.right(p) == Some(child) {
                return Some(p);
            }
            child = p;
            parent = self.node(p).parent;
        }
        None
    }

    fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.node(id).color == Color::Red)
    }

    pub(crate) fn count(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |id| self.node(id).count)
    }

    // ── Structural primitives ───────────────────────────────────────

    fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
        self.node_mut(id).left = child;
        if let Some(c) = child {
            self.node_mut(c).parent = Some(id);
        }
    }

    fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
        self.node_mut(id).right = child;
        if let Some(c) = child {
            self.node_mut(c).parent = Some(id);
        }
    }

    fn update_count(&mut self, id: NodeId) {
        let count = 1 + self.count(self.left(id)) + self.count(self.right(id));
        self.node_mut(id).count = count;
    }

    /// Make a right-leaning red link lean left. Returns the new subtree
    /// root, already linked to the old root's parent.
    fn rotate_left(&mut self, h: NodeId) -> NodeId {
        let x = self.right(h).expect("rotate_left requires a right child");
        let parent = self.node(h).parent;
        let x_left = self.left(x);
        self.set_right(h, x_left);
        self.set_left(x, Some(h));
        self.node_mut(x).parent = parent;

        let h_color = self.node(h).color;
        let h_count = self.node(h).count;
        {
            let x_node = self.node_mut(x);
            x_node.color = h_color;
            x_node.count = h_count;
        }
        self.node_mut(h).color = Color::Red;
        self.update_count(h);
        x
    }

    /// Make a left-leaning red link lean right.
    fn rotate_right(&mut self, h: NodeId) -> NodeId {
        let x = self.left(h).expect("rotate_right requires a left child");
        let parent = self.node(h).parent;
        let x_right = self.right(x);
        self.set_left(h, x_right);
        self.set_right(x, Some(h));
        self.node_mut(x).parent = parent;

        let h_color = self.node(h).color;
        let h_count = self.node(h).count;
        {
            let x_node = self.node_mut(x);
            x_node.color = h_color;
            x_node.count = h_count;
        }
        self.node_mut(h).color = Color::Red;
        self.update_count(h);
        x
    }

    fn flip_colors(&mut self, h: NodeId) {
        let (left, right) = {
            let node = self.node_mut(h);
            node.color = node.color.flipped();
            (node.left, node.right)
        };
        for child in [left, right].into_iter().flatten() {
            let node = self.node_mut(child);
            node.color = node.color.flipped();
        }
    }

    /// Assuming `h` is red and both children are black, make `h.left` or
    /// one of its children red.
    fn move_red_left(&mut self, mut h: NodeId) -> NodeId {
        self.flip_colors(h);
        let right_left = self.right(h).and_then(|r| self.left(r));
        if self.is_red(right_left) {
            let r = self.right(h).expect("checked above");
            let r = self.rotate_right(r);
            self.set_right(h, Some(r));
            h = self.rotate_left(h);
            self.flip_colors(h);
        }
        h
    }

    /// Assuming `h` is red and both children are black, make `h.right` or
    /// one of its children red.
    fn move_red_right(&mut self, mut h: NodeId) -> NodeId {
        self.flip_colors(h);
        let left_left = self.left(h).and_then(|l| self.left(l));
        if self.is_red(left_left) {
            h = self.rotate_right(h);
            self.flip_colors(h);
        }
        h
    }

    /// Restore the LLRB shape at `h` on the way back up and refresh its
    /// subtree count.
    fn balance(&mut self, mut h: NodeId) -> NodeId {
        if self.is_red(self.right(h)) {
            h = self.rotate_left(h);
        }
        let left = self.left(h);
        if self.is_red(left) && self.is_red(left.and_then(|l| self.left(l))) {
            h = self.rotate_right(h);
        }
        if self.is_red(self.left(h)) && self.is_red(self.right(h)) {
            self.flip_colors(h);
        }
        self.update_count(h);
        h
    }

    // ── Insertion ───────────────────────────────────────────────────

    /// Insert the detached `leaf` below `h`. Keys are known to be distinct.
    fn insert(&mut self, h: Option<NodeId>, leaf: NodeId) -> NodeId {
        let Some(mut h) = h else {
            return leaf;
        };
        if self.node(leaf).key < self.node(h).key {
            let l = self.insert(self.left(h), leaf);
            self.set_left(h, Some(l));
        } else {
            let r = self.insert(self.right(h), leaf);
            self.set_right(h, Some(r));
        }

        if self.is_red(self.right(h)) && !self.is_red(self.left(h)) {
            h = self.rotate_left(h);
        }
        let left = self.left(h);
        if self.is_red(left) && self.is_red(left.and_then(|l| self.left(l))) {
            h = self.rotate_right(h);
        }
        if self.is_red(self.left(h)) && self.is_red(self.right(h)) {
            self.flip_colors(h);
        }
        self.update_count(h);
        h
    }

    // ── Deletion ────────────────────────────────────────────────────

    /// Detach the node holding `key` from the subtree at `h`.
    ///
    /// `key` must be present. Returns the new subtree root and the slot of
    /// the detached node, whose payload is the removed entry.
    fn remove_node(&mut self, mut h: NodeId, key: i64) -> (Option<NodeId>, NodeId) {
        let removed;
        if key < self.node(h).key {
            let left = self.left(h).expect("present key below h implies a left subtree");
            if !self.is_red(Some(left)) && !self.is_red(self.left(left)) {
                h = self.move_red_left(h);
            }
            let left = self.left(h).expect("left subtree survives move_red_left");
            let (rest, detached) = self.remove_node(left, key);
            self.set_left(h, rest);
            removed = detached;
        } else {
            if self.is_red(self.left(h)) {
                h = self.rotate_right(h);
            }
            if key == self.node(h).key && self.right(h).is_none() {
                // A node without a right child has no left child either
                // once any red left link has been rotated away.
                return (None, h);
            }
            let right = self.right(h).expect("present key right of h implies a right subtree");
            if !self.is_red(Some(right)) && !self.is_red(self.left(right)) {
                h = self.move_red_right(h);
            }
            let right = self.right(h).expect("right subtree survives move_red_right");
            if key == self.node(h).key {
                let (rest, successor) = self.remove_first(right);
                self.set_right(h, rest);
                // `h` stays in place and takes over the successor's entry;
                // the successor's slot carries the removed entry out.
                self.swap_payload(h, successor);
                removed = successor;
            } else {
                let (rest, detached) = self.remove_node(right, key);
                self.set_right(h, rest);
                removed = detached;
            }
        }
        (Some(self.balance(h)), removed)
    }

    /// Detach the minimum node of the subtree at `h`.
    fn remove_first(&mut self, mut h: NodeId) -> (Option<NodeId>, NodeId) {
        let Some(left) = self.left(h) else {
            return (None, h);
        };
        if !self.is_red(Some(left)) && !self.is_red(self.left(left)) {
            h = self.move_red_left(h);
        }
        let left = self.left(h).expect("left subtree survives move_red_left");
        let (rest, min) = self.remove_first(left);
        self.set_left(h, rest);
        (Some(self.balance(h)), min)
    }

    /// Exchange key, value and byte size between two distinct nodes.
    fn swap_payload(&mut self, a: NodeId, b: NodeId) {
        let mut b_node = self.slots[b]
            .take()
            .expect("linked node must occupy its slot");
        let a_node = self.node_mut(a);
        mem::swap(&mut a_node.key, &mut b_node.key);
        mem::swap(&mut a_node.value, &mut b_node.value);
        mem::swap(&mut a_node.data_size, &mut b_node.data_size);
        self.slots[b] = Some(b_node);
    }
}

impl<'a, V> IntoIterator for &'a BlockIndex<V> {
    type Item = (i64, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for BlockIndex<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
