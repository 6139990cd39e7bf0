//! Rotations and the two red-black fix-up procedures.

use log::trace;

use crate::rb_node::{Color, Node, NodeId, Side};
use crate::RbTree;

impl<K, V> RbTree<K, V> {
    /// Absent children count as black.
    pub(super) fn is_red(&self, node: Option<NodeId>) -> bool {
        node.map_or(false, |id| self.nodes[id].is_red())
    }

    /// Which child slot of `parent` holds `child`.
    pub(super) fn side_of(&self, child: NodeId, parent: NodeId) -> Side {
        if self.nodes[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    /// Points whatever linked to `old` (its parent's slot, or the root) at
    /// `new`. The caller fixes `new`'s parent link.
    pub(super) fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            Some(parent) => {
                let side = self.side_of(old, parent);
                self.nodes[parent].set_child(side, new);
            }
            None => self.root = new,
        }
    }

    /// Rotates `node` down towards `side`; its child on the opposite side
    /// takes its place. No-op when that child is absent.
    //
    //  rotate(n, Left):
    //
    //       g                  g
    //       |                  |
    //       n         -->      p
    //      / \                / \
    //     a   p              n   c
    //        / \            / \
    //       b   c          a   b
    //
    pub(super) fn rotate(&mut self, node: NodeId, side: Side) {
        let Some(pivot) = self.nodes[node].child(side.opposite()) else {
            return;
        };
        trace!("rotate {:?} at node {}", side, node);

        let inner = self.nodes[pivot].child(side);
        self.nodes[node].set_child(side.opposite(), inner);
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(node);
        }

        let parent = self.nodes[node].parent;
        self.nodes[pivot].parent = parent;
        self.replace_child(parent, node, Some(pivot));

        self.nodes[pivot].set_child(side, Some(node));
        self.nodes[node].parent = Some(pivot);
    }

    /// Restores the red-black properties after `node` was linked in as a red
    /// leaf.
    pub(super) fn insert_fixup(&mut self, mut node: NodeId) {
        while let Some(mut parent) = self.nodes[node].parent {
            // loop invariant: node is red
            if self.nodes[parent].is_black() {
                break;
            }

            // a red parent is never the root, so the grandparent exists
            let grandparent = self.nodes[parent]
                .parent
                .expect("red node without a parent");
            let side = self.side_of(parent, grandparent);
            let uncle = self.nodes[grandparent].child(side.opposite());

            if self.is_red(uncle) {
                // case 1: red uncle, push the red up to the grandparent
                trace!("insert fixup: recolor at grandparent {}", grandparent);
                if let Some(uncle) = uncle {
                    self.nodes[uncle].color = Color::Black;
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;
                node = grandparent;
                continue;
            }

            if self.nodes[parent].child(side.opposite()) == Some(node) {
                // case 2: inner child, rotate into the outer shape
                trace!("insert fixup: inner child {}", node);
                self.rotate(parent, side);
                parent = node;
            }

            // case 3: outer child
            trace!("insert fixup: outer rotation at {}", grandparent);
            self.nodes[parent].color = Color::Black;
            self.nodes[grandparent].color = Color::Red;
            self.rotate(grandparent, side.opposite());
            break;
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Physically removes `id`, which must have at most one child, and
    /// rebalances. Returns the released node.
    pub(super) fn unlink(&mut self, id: NodeId) -> Node<K, V> {
        let node = &self.nodes[id];
        debug_assert!(node.left.is_none() || node.right.is_none());
        let (child, parent, color) = (node.left.or(node.right), node.parent, node.color);

        if color == Color::Red && child.is_none() {
            // a red leaf carries no black height
            self.replace_child(parent, id, None);
            return self.nodes.remove(id);
        }

        self.replace_child(parent, id, child);
        if let Some(child) = child {
            self.nodes[child].parent = parent;
        }
        let removed = self.nodes.remove(id);
        if removed.is_black() {
            self.erase_fixup(child, parent);
        }
        removed
    }

    /// `node` took the place of a removed black node and is one black short.
    /// It may be absent, so its parent is tracked alongside it.
    fn erase_fixup(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
        while node != self.root && !self.is_red(node) {
            let Some(p) = parent else {
                break;
            };
            // an absent node is on the side where the parent has no child
            let side = if self.nodes[p].left == node {
                Side::Left
            } else {
                Side::Right
            };
            let mut sibling = self.nodes[p]
                .child(side.opposite())
                .expect("black height deficit without a sibling");

            if self.nodes[sibling].is_red() {
                // case 1: red sibling, rotate it above the parent
                trace!("erase fixup: red sibling {}", sibling);
                self.nodes[sibling].color = Color::Black;
                self.nodes[p].color = Color::Red;
                self.rotate(p, side);
                sibling = self.nodes[p]
                    .child(side.opposite())
                    .expect("red sibling must have black children");
            }

            let near = self.nodes[sibling].child(side);
            let far = self.nodes[sibling].child(side.opposite());

            if !self.is_red(near) && !self.is_red(far) {
                // case 2: both nephews black, move the deficit up
                trace!("erase fixup: recolor sibling {}", sibling);
                self.nodes[sibling].color = Color::Red;
                node = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }

            if !self.is_red(far) {
                // case 3: only the near nephew is red, turn it into the far one
                trace!("erase fixup: near nephew of {}", sibling);
                let near = near.expect("red near nephew");
                self.nodes[near].color = Color::Black;
                self.nodes[sibling].color = Color::Red;
                self.rotate(sibling, side.opposite());
                sibling = near;
            }

            // case 4: far nephew red
            trace!("erase fixup: rotate parent {}", p);
            self.nodes[sibling].color = self.nodes[p].color;
            self.nodes[p].color = Color::Black;
            if let Some(far) = self.nodes[sibling].child(side.opposite()) {
                self.nodes[far].color = Color::Black;
            }
            self.rotate(p, side);
            node = self.root;
            parent = None;
        }

        if let Some(node) = node {
            self.nodes[node].color = Color::Black;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::rb_node::{Color, Side};
    use crate::RbTree;

    fn keys_by_layer(tree: &RbTree<u32, ()>) -> Vec<Vec<u32>> {
        crate::rb_node::bfs(&tree.nodes, tree.root)
            .into_iter()
            .map(|layer| layer.into_iter().map(|(k, _)| k).collect())
            .collect()
    }

    #[test]
    fn test_rotate_left_at_root() {
        let mut tree = RbTree::new();
        for k in [2, 1, 4, 3, 5] {
            tree.insert(k, ());
        }
        assert_eq!(keys_by_layer(&tree), vec![vec![2], vec![1, 4], vec![3, 5]]);

        let root = tree.root.unwrap();
        tree.rotate(root, Side::Left);

        assert_eq!(keys_by_layer(&tree), vec![vec![4], vec![2, 5], vec![1, 3]]);
        let new_root = tree.root.unwrap();
        assert_eq!(tree.nodes[new_root].key, 4);
        assert_eq!(tree.nodes[new_root].parent, None);
        assert_eq!(tree.nodes[root].parent, Some(new_root));
    }

    #[test]
    fn test_rotate_right_below_root() {
        let mut tree = RbTree::new();
        for k in [10, 5, 15, 3, 7] {
            tree.insert(k, ());
        }
        let five = tree.find(&5).node.unwrap();
        tree.rotate(five, Side::Right);

        assert_eq!(keys_by_layer(&tree), vec![vec![10], vec![3, 15], vec![5], vec![7]]);
        let three = tree.find(&3).node.unwrap();
        assert_eq!(tree.nodes[five].parent, Some(three));
        assert_eq!(tree.nodes[three].parent, tree.root);
        // in-order sequence is unaffected by rotations
        let keys: Vec<_> = tree.keys().copied().collect();
        assert_eq!(keys, vec![3, 5, 7, 10, 15]);
    }

    #[test]
    fn test_rotate_without_pivot_is_noop() {
        let mut tree = RbTree::new();
        tree.insert(1, ());
        tree.insert(2, ());
        let one = tree.root.unwrap();
        tree.rotate(one, Side::Right);
        assert_eq!(tree.root, Some(one));
        assert_eq!(keys_by_layer(&tree), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_insert_fixup_recolors_red_uncle() {
        let mut tree = RbTree::new();
        for k in [2, 1, 3, 4] {
            tree.insert(k, ());
        }
        let colors: Vec<_> = crate::rb_node::bfs(&tree.nodes, tree.root)
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(
            colors,
            vec![
                (2, Color::Black),
                (1, Color::Black),
                (3, Color::Black),
                (4, Color::Red),
            ]
        );
    }
}
