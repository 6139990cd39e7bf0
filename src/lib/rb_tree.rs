//! A red-black tree map with ordered keys.
#![warn(missing_docs)]

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ops::Index;

use log::debug;
use slab::Slab;

mod rb_balance;
mod rb_error;
mod rb_iter;
mod rb_node;

pub use rb_error::RbTreeError;
pub use rb_iter::{Cursor, IntoIter, Iter, IterMut, Keys, Position, Values};

use rb_node::{Color, Node, NodeId, Side};

/// An ordered map backed by a red-black tree.
///
/// Nodes live in an arena and link to each other by index, so parent links
/// and rotations need no raw pointers. Entries can be addressed either by key
/// or by [`Position`], a copyable handle that also represents the
/// one-past-the-end position.
#[derive(Clone)]
pub struct RbTree<K, V> {
    nodes: Slab<Node<K, V>>,
    root: Option<NodeId>,
    length: usize,
}

enum SearchResult {
    Found(NodeId),
    // parent is `None` when the tree is empty
    Vacant { parent: Option<NodeId>, side: Side },
}

use SearchResult::*;

impl<K, V> RbTree<K, V> {
    /// Creates a new empty tree. Does not allocate.
    pub fn new() -> Self {
        RbTree {
            nodes: Slab::new(),
            root: None,
            length: 0,
        }
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The largest number of elements the tree could ever hold.
    pub fn max_size(&self) -> usize {
        isize::MAX as usize / mem::size_of::<Node<K, V>>().max(1)
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        debug!("clearing tree of {} entries", self.length);
        self.nodes.clear();
        self.root = None;
        self.length = 0;
    }

    /// Exchanges the contents of two trees in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        debug!("swapping trees of {} and {} entries", self.length, other.length);
        mem::swap(self, other);
    }

    /// Position of the smallest entry, or [`end`](Self::end) when empty.
    pub fn begin(&self) -> Position {
        match self.root {
            Some(root) => Position::at(self.leftmost(root)),
            None => Position::END,
        }
    }

    /// The one-past-the-last position. Stepping back from it with
    /// [`prev`](Self::prev) reaches the largest entry.
    pub fn end(&self) -> Position {
        Position::END
    }

    /// The position after `pos` in key order. The end position maps to
    /// itself.
    pub fn next(&self, pos: Position) -> Position {
        match pos.node.filter(|&id| self.nodes.contains(id)) {
            Some(id) => Position {
                node: self.successor(id),
            },
            None => Position::END,
        }
    }

    /// The position before `pos` in key order. From the end position this is
    /// the largest entry; the smallest entry maps to itself.
    pub fn prev(&self, pos: Position) -> Position {
        match pos.node.filter(|&id| self.nodes.contains(id)) {
            Some(id) => Position::at(self.predecessor(id).unwrap_or(id)),
            None => match self.root {
                Some(root) => Position::at(self.rightmost(root)),
                None => Position::END,
            },
        }
    }

    /// The entry at `pos`, or `None` for the end position.
    pub fn key_value_at(&self, pos: Position) -> Option<(&K, &V)> {
        let node = self.nodes.get(pos.node?)?;
        Some((&node.key, &node.value))
    }

    /// Mutable access to the value at `pos`, or `None` for the end position.
    pub fn value_mut_at(&mut self, pos: Position) -> Option<&mut V> {
        self.nodes.get_mut(pos.node?).map(|node| &mut node.value)
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.key_value_at(self.begin())
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.key_value_at(self.prev(self.end()))
    }

    /// A cursor on the smallest entry (on the end if the tree is empty).
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        self.cursor_at(self.begin())
    }

    /// A cursor on the largest entry (on the end if the tree is empty).
    pub fn cursor_back(&self) -> Cursor<'_, K, V> {
        self.cursor_at(self.prev(self.end()))
    }

    /// A cursor on the end position.
    pub fn cursor_end(&self) -> Cursor<'_, K, V> {
        self.cursor_at(Position::END)
    }

    /// A cursor starting at `pos`.
    pub fn cursor_at(&self, pos: Position) -> Cursor<'_, K, V> {
        Cursor {
            tree: self,
            position: pos,
        }
    }

    /// Removes the entry at `pos` and returns it. The end position, or a
    /// position whose entry is already gone, is a no-op.
    ///
    /// An entry with two children is not unlinked itself: its key and value
    /// trade places with its in-order successor's, and the successor's node
    /// is removed instead. After such an erase, a position that named the
    /// successor's entry is invalid, and `pos` itself names the successor's
    /// entry.
    pub fn erase(&mut self, pos: Position) -> Option<(K, V)> {
        let target = pos.node.filter(|&id| self.nodes.contains(id))?;

        if self.length == 1 {
            let node = self.nodes.remove(target);
            self.root = None;
            self.length = 0;
            return Some((node.key, node.value));
        }

        let mut doomed = target;
        if let (Some(_), Some(right)) = (self.nodes[target].left, self.nodes[target].right) {
            let successor = self.leftmost(right);
            let (a, b) = self
                .nodes
                .get2_mut(target, successor)
                .expect("successor is a distinct live node");
            mem::swap(&mut a.key, &mut b.key);
            mem::swap(&mut a.value, &mut b.value);
            doomed = successor;
        }

        let node = self.unlink(doomed);
        self.length -= 1;
        Some((node.key, node.value))
    }

    /// Returns an iterator over the entries in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Returns a mutable iterator over the entries in key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self)
    }

    /// Returns an iterator over the keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }
}

impl<K, V> Default for RbTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RbTree<K, V>
where
    K: Ord,
{
    fn search_tree<Q>(&self, key: &Q) -> SearchResult
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        let mut vacancy = Vacant {
            parent: None,
            side: Side::Left,
        };
        while let Some(id) = current {
            let node = &self.nodes[id];
            let side = match key.cmp(node.key.borrow()) {
                Ordering::Equal => return Found(id),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            vacancy = Vacant {
                parent: Some(id),
                side,
            };
            current = node.child(side);
        }
        vacancy
    }

    /// Links a new red node into the slot found by `search_tree` and
    /// rebalances. The node keeps its id through the fix-up.
    fn insert_vacant(&mut self, parent: Option<NodeId>, side: Side, key: K, value: V) -> NodeId {
        let id = self.nodes.insert(Node::new(key, value, parent));
        match parent {
            Some(parent) => self.nodes[parent].set_child(side, Some(id)),
            None => self.root = Some(id),
        }
        self.length += 1;
        self.insert_fixup(id);
        id
    }

    /// Inserts a key-value pair.
    ///
    /// Returns the position of the entry with this key and whether it was
    /// newly inserted. An existing entry is left untouched and the passed key
    /// and value are dropped.
    pub fn insert(&mut self, key: K, value: V) -> (Position, bool) {
        match self.search_tree(&key) {
            Found(id) => (Position::at(id), false),
            Vacant { parent, side } => (Position::at(self.insert_vacant(parent, side, key, value)), true),
        }
    }

    /// Inserts a key-value pair, overwriting the value of an existing entry.
    ///
    /// The flag is `true` when the tree changed: the key was new, or its
    /// stored value differed from `value`.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Position, bool)
    where
        V: PartialEq,
    {
        match self.search_tree(&key) {
            Found(id) => {
                let stored = &mut self.nodes[id].value;
                if *stored == value {
                    (Position::at(id), false)
                } else {
                    *stored = value;
                    (Position::at(id), true)
                }
            }
            Vacant { parent, side } => (Position::at(self.insert_vacant(parent, side, key, value)), true),
        }
    }

    /// Returns a mutable reference to the value for `key`, inserting the
    /// result of `default` first if the key is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let id = match self.search_tree(&key) {
            Found(id) => id,
            Vacant { parent, side } => self.insert_vacant(parent, side, key, default()),
        };
        &mut self.nodes[id].value
    }

    /// Returns a mutable reference to the value for `key`, inserting
    /// `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Position of the entry for `key`, or [`end`](Self::end) if absent.
    pub fn find<Q>(&self, key: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search_tree(key) {
            Found(id) => Position::at(id),
            Vacant { .. } => Position::END,
        }
    }

    /// Returns true if the tree contains `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        matches!(self.search_tree(key), Found(_))
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.key_value_at(self.find(key))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let pos = self.find(key);
        self.value_mut_at(pos)
    }

    /// Like [`get`](Self::get), but a missing key is an error.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, RbTreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).ok_or(RbTreeError::KeyNotFound)
    }

    /// Like [`get_mut`](Self::get_mut), but a missing key is an error.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, RbTreeError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_mut(key).ok_or(RbTreeError::KeyNotFound)
    }

    /// Removes a key from the tree, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let pos = self.find(key);
        self.erase(pos).map(|(_, v)| v)
    }

    /// Moves every entry of `other` whose key is not yet in `self` into
    /// `self`. Entries with a key `self` already holds stay in `other`.
    ///
    /// `other` is rebuilt, so positions into it are invalidated.
    pub fn merge(&mut self, other: &mut Self) {
        let incoming = mem::take(other);
        let mut moved = 0usize;
        for (key, value) in incoming {
            match self.search_tree(&key) {
                Found(_) => {
                    other.insert(key, value);
                }
                Vacant { parent, side } => {
                    self.insert_vacant(parent, side, key, value);
                    moved += 1;
                }
            }
        }
        debug!("merge moved {} entries, {} stayed behind", moved, other.length);
    }

    /// Checks every red-black and search-tree invariant and returns the
    /// tree's black height (absent children not counted).
    ///
    /// The tree maintains these invariants itself; an error here means the
    /// structure was corrupted by a bug.
    pub fn validate(&self) -> Result<usize, RbTreeError> {
        let Some(root) = self.root else {
            return match self.length {
                0 => Ok(0),
                n => Err(RbTreeError::LengthMismatch {
                    counted: 0,
                    recorded: n,
                }),
            };
        };
        if self.nodes[root].parent.is_some() {
            return Err(RbTreeError::BrokenParentLink);
        }
        if self.nodes[root].is_red() {
            return Err(RbTreeError::RedRoot);
        }

        let mut counted = 0;
        let blacks = self.validate_subtree(root, None, None, &mut counted)?;
        if counted != self.length || self.nodes.len() != self.length {
            return Err(RbTreeError::LengthMismatch {
                counted,
                recorded: self.length,
            });
        }
        Ok(blacks)
    }

    fn validate_subtree(
        &self,
        id: NodeId,
        lower: Option<&K>,
        upper: Option<&K>,
        counted: &mut usize,
    ) -> Result<usize, RbTreeError> {
        let node = &self.nodes[id];
        *counted += 1;
        if lower.map_or(false, |lower| node.key <= *lower) || upper.map_or(false, |upper| node.key >= *upper) {
            return Err(RbTreeError::SortError);
        }

        let mut heights = [0usize; 2];
        for (slot, child) in [node.left, node.right].into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if self.nodes[child].parent != Some(id) {
                return Err(RbTreeError::BrokenParentLink);
            }
            if node.is_red() && self.nodes[child].is_red() {
                return Err(RbTreeError::ConsecutiveReds);
            }
            let (lower, upper) = if slot == 0 {
                (lower, Some(&node.key))
            } else {
                (Some(&node.key), upper)
            };
            heights[slot] = self.validate_subtree(child, lower, upper, counted)?;
        }

        if heights[0] != heights[1] {
            return Err(RbTreeError::UnbalancedBlacks {
                left: heights[0],
                right: heights[1],
            });
        }
        Ok(heights[0] + usize::from(node.color == Color::Black))
    }
}

impl<K, V> fmt::Debug for RbTree<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> PartialEq for RbTree<K, V>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for RbTree<K, V> {}

impl<K, Q, V> Index<&Q> for RbTree<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the tree.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for RbTree<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K: Ord, V> Extend<(K, V)> for RbTree<K, V> {
    /// Inserts every pair; pairs whose key is already present are dropped.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for RbTree<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K, V> IntoIterator for RbTree<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}

impl<'a, K, V> IntoIterator for &'a RbTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> IntoIterator for &'a mut RbTree<K, V> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
