use std::iter::FusedIterator;
use std::ptr;

use slab::Slab;

use crate::rb_node::{Node, NodeId};
use crate::RbTree;

/// A handle to an entry of an [`RbTree`], or to the position one past the
/// last entry.
///
/// Positions are plain copyable values that do not borrow the tree. They stay
/// meaningful until the entry they name is erased; see [`RbTree::erase`] for
/// how erasing a different entry can shift what a position names. Using a
/// stale position is never undefined behaviour, it just finds nothing or some
/// other entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(super) node: Option<NodeId>,
}

impl Position {
    pub(super) const END: Position = Position { node: None };

    pub(super) fn at(node: NodeId) -> Self {
        Position { node: Some(node) }
    }

    /// Returns `true` for the one-past-the-end position.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }
}

impl<K, V> RbTree<K, V> {
    pub(super) fn leftmost(&self, mut node: NodeId) -> NodeId {
        while let Some(left) = self.nodes[node].left {
            node = left;
        }
        node
    }

    pub(super) fn rightmost(&self, mut node: NodeId) -> NodeId {
        while let Some(right) = self.nodes[node].right {
            node = right;
        }
        node
    }

    /// In-order successor, `None` past the maximum.
    pub(super) fn successor(&self, node: NodeId) -> Option<NodeId> {
        if let Some(right) = self.nodes[node].right {
            return Some(self.leftmost(right));
        }
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// In-order predecessor, `None` before the minimum.
    pub(super) fn predecessor(&self, node: NodeId) -> Option<NodeId> {
        if let Some(left) = self.nodes[node].left {
            return Some(self.rightmost(left));
        }
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            if self.nodes[parent].right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Node ids in key order.
    pub(super) fn in_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.length);
        let mut next = self.root.map(|root| self.leftmost(root));
        while let Some(node) = next {
            order.push(node);
            next = self.successor(node);
        }
        order
    }
}

/// A read-only cursor over an [`RbTree`], able to step in both directions
/// and to sit on the end position.
pub struct Cursor<'a, K, V> {
    pub(super) tree: &'a RbTree<K, V>,
    pub(super) position: Position,
}

impl<'a, K, V> Cursor<'a, K, V> {
    /// Steps to the next entry in key order. At the end this is a no-op.
    pub fn move_next(&mut self) {
        self.position = self.tree.next(self.position);
    }

    /// Steps to the previous entry in key order. From the end this lands on
    /// the last entry; on the first entry it stays put.
    pub fn move_prev(&mut self) {
        self.position = self.tree.prev(self.position);
    }

    /// The position the cursor is on, usable with [`RbTree::erase`] once the
    /// cursor is dropped.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns `true` when the cursor is past the last entry.
    pub fn is_end(&self) -> bool {
        self.position.is_end()
    }

    /// The key under the cursor, `None` at the end.
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    /// The value under the cursor, `None` at the end.
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    /// The entry under the cursor, `None` at the end.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        self.tree.key_value_at(self.position)
    }
}

impl<K, V> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Cursor {
            tree: self.tree,
            position: self.position,
        }
    }
}

impl<K, V> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.position == other.position
    }
}

impl<K, V> Eq for Cursor<'_, K, V> {}

/// Iterator over the entries of an [`RbTree`] in key order.
pub struct Iter<'a, K, V> {
    pub(super) tree: &'a RbTree<K, V>,
    pub(super) front: Option<NodeId>,
    pub(super) back: Option<NodeId>,
    pub(super) remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(tree: &'a RbTree<K, V>) -> Self {
        Iter {
            tree,
            front: tree.root.map(|root| tree.leftmost(root)),
            back: tree.root.map(|root| tree.rightmost(root)),
            remaining: tree.length,
        }
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.front?;
        self.front = self.tree.successor(node);
        self.remaining -= 1;
        let node = &self.tree.nodes[node];
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.back?;
        self.back = self.tree.predecessor(node);
        self.remaining -= 1;
        let node = &self.tree.nodes[node];
        Some((&node.key, &node.value))
    }
}

impl<'a, K: 'a, V: 'a> ExactSizeIterator for Iter<'a, K, V> {}

impl<'a, K: 'a, V: 'a> FusedIterator for Iter<'a, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

/// Mutable iterator over the entries of an [`RbTree`] in key order.
pub struct IterMut<'a, K, V> {
    entries: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    // The arena hands out disjoint borrows in slot order; they are then
    // rearranged into key order.
    pub(super) fn new(tree: &'a mut RbTree<K, V>) -> Self {
        let order = tree.in_order();
        let mut slots: Vec<Option<(&'a K, &'a mut V)>> = Vec::new();
        for (id, node) in tree.nodes.iter_mut() {
            if slots.len() <= id {
                slots.resize_with(id + 1, || None);
            }
            slots[id] = Some((&node.key, &mut node.value));
        }
        let entries: Vec<_> = order
            .into_iter()
            .filter_map(|id| slots[id].take())
            .collect();
        IterMut {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over the entries of an [`RbTree`] in key order.
pub struct IntoIter<K, V> {
    nodes: Slab<Node<K, V>>,
    order: std::vec::IntoIter<NodeId>,
}

impl<K, V> IntoIter<K, V> {
    pub(super) fn new(tree: RbTree<K, V>) -> Self {
        let order = tree.in_order().into_iter();
        IntoIter {
            nodes: tree.nodes,
            order,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        let node = self.nodes.remove(self.order.next()?);
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        let node = self.nodes.remove(self.order.next_back()?);
        Some((node.key, node.value))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

/// Iterator over the keys of an [`RbTree`] in order.
pub struct Keys<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over the values of an [`RbTree`] in key order.
pub struct Values<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
