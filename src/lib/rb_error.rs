use std::error::Error;
use std::fmt;

/// Errors reported by [`RbTree`](crate::RbTree).
///
/// [`KeyNotFound`](RbTreeError::KeyNotFound) is the only variant a caller
/// sees from normal use. The rest come from
/// [`RbTree::validate`](crate::RbTree::validate) and mean the tree's
/// structure was broken by a bug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RbTreeError {
    /// `at`/`at_mut` was asked for a key that is not in the tree.
    KeyNotFound,
    /// The root node is red.
    RedRoot,
    /// A red node has a red child.
    ConsecutiveReds,
    /// Two sibling subtrees disagree on their black height.
    UnbalancedBlacks {
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// A key is out of order with respect to one of its ancestors.
    SortError,
    /// A child's parent link does not point back at its parent.
    BrokenParentLink,
    /// The recorded length differs from the number of reachable nodes.
    LengthMismatch {
        /// Nodes reached from the root.
        counted: usize,
        /// Length the tree believes it has.
        recorded: usize,
    },
}

impl fmt::Display for RbTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RbTreeError::KeyNotFound => write!(f, "key not found"),
            RbTreeError::RedRoot => write!(f, "root node is red"),
            RbTreeError::ConsecutiveReds => write!(f, "red node has a red child"),
            RbTreeError::UnbalancedBlacks { left, right } => {
                write!(f, "unbalanced blacks left: {} and right: {}", left, right)
            }
            RbTreeError::SortError => write!(f, "keys out of order"),
            RbTreeError::BrokenParentLink => write!(f, "child does not link back to its parent"),
            RbTreeError::LengthMismatch { counted, recorded } => write!(
                f,
                "counted {} nodes but length is {}",
                counted, recorded
            ),
        }
    }
}

impl Error for RbTreeError {}
