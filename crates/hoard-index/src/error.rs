//! Index-specific error types.

use std::error::Error;
use std::fmt;

/// Errors returned by [`BlockIndex`](crate::BlockIndex) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// No node is stored under the key.
    NotFound {
        /// The key that was looked up.
        key: i64,
    },
    /// The key is [`NULL_KEY`](crate::NULL_KEY), which is reserved for
    /// "no such key" signaling and may not be stored.
    ReservedKey,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => write!(f, "key {key} not found"),
            Self::ReservedKey => write!(f, "key i64::MIN is reserved"),
        }
    }
}

impl Error for IndexError {}

/// A structural defect found by
/// [`BlockIndex::check_invariants`](crate::BlockIndex::check_invariants).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root node is red.
    RedRoot,
    /// A red link leans right.
    RightLeaningRed {
        /// Key of the node whose right child is red.
        key: i64,
    },
    /// A red node has a red left child.
    ConsecutiveRed {
        /// Key of the upper red node.
        key: i64,
    },
    /// Two root-to-leaf paths below this node cross a different number
    /// of black links.
    BlackHeightMismatch {
        /// Key of the node whose subtrees disagree.
        key: i64,
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// A subtree count disagrees with the number of nodes below it.
    CountMismatch {
        /// Key of the node carrying the wrong count.
        key: i64,
        /// The stored count.
        stored: usize,
        /// The actual number of nodes in the subtree.
        actual: usize,
    },
    /// A key violates the search-tree ordering.
    OutOfOrder {
        /// The misplaced key.
        key: i64,
    },
    /// A child's parent link does not point back at its parent.
    BrokenParentLink {
        /// Key of the child with the wrong parent link.
        key: i64,
    },
    /// A link points at a vacant slot.
    DanglingLink {
        /// The vacant slot index.
        slot: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot => write!(f, "root is red"),
            Self::RightLeaningRed { key } => write!(f, "node {key} has a red right link"),
            Self::ConsecutiveRed { key } => write!(f, "red node {key} has a red left child"),
            Self::BlackHeightMismatch { key, left, right } => write!(
                f,
                "black height mismatch below node {key}: left {left}, right {right}"
            ),
            Self::CountMismatch {
                key,
                stored,
                actual,
            } => write!(
                f,
                "node {key} stores subtree count {stored}, actual {actual}"
            ),
            Self::OutOfOrder { key } => write!(f, "key {key} is out of order"),
            Self::BrokenParentLink { key } => write!(f, "node {key} has a broken parent link"),
            Self::DanglingLink { slot } => write!(f, "link to vacant slot {slot}"),
        }
    }
}

impl Error for InvariantViolation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_key() {
        let err = IndexError::NotFound { key: -7 };
        assert_eq!(err.to_string(), "key -7 not found");
    }

    #[test]
    fn violations_display_context() {
        let v = InvariantViolation::CountMismatch {
            key: 3,
            stored: 4,
            actual: 5,
        };
        assert!(v.to_string().contains("stores subtree count 4"));
    }
}
