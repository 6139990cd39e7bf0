/// Index of a node inside the tree's arena.
pub(super) type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Color {
    Red,
    Black,
}

/// Which child slot of a parent a link occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Side {
    Left,
    Right,
}

impl Side {
    pub(super) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

// Absent children and the root's parent are `None`; there is no shared
// sentinel node in the arena.
#[derive(Clone)]
pub(super) struct Node<K, V> {
    pub(super) key: K,
    pub(super) value: V,
    pub(super) color: Color,
    pub(super) left: Option<NodeId>,
    pub(super) right: Option<NodeId>,
    pub(super) parent: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    /// A fresh red leaf hanging off `parent`.
    pub(super) fn new(key: K, value: V, parent: Option<NodeId>) -> Self {
        Node {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
            parent,
        }
    }

    pub(super) fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    pub(super) fn is_black(&self) -> bool {
        self.color == Color::Black
    }

    pub(super) fn child(&self, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(super) fn set_child(&mut self, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }
}

/// Level-order dump of `(key, color)` pairs, one vector per depth. Used by
/// test diagnostics when an invariant check fails.
#[cfg(test)]
pub(super) fn bfs<K: Clone, V>(
    nodes: &slab::Slab<Node<K, V>>,
    root: Option<NodeId>,
) -> Vec<Vec<(K, Color)>> {
    use std::collections::VecDeque;

    let mut result: Vec<Vec<(K, Color)>> = Vec::new();
    let mut queue = VecDeque::new();
    if let Some(root) = root {
        queue.push_back((root, 0usize));
    }
    while let Some((id, layer)) = queue.pop_front() {
        let node = &nodes[id];
        if result.len() <= layer {
            result.push(Vec::new());
        }
        result[layer].push((node.key.clone(), node.color));
        for child in [node.left, node.right].into_iter().flatten() {
            queue.push_back((child, layer + 1));
        }
    }
    result
}
