//! Structural invariant checks for [`BlockIndex`].

use crate::error::InvariantViolation;
use crate::tree::{BlockIndex, Color, NodeId};

pub(crate) fn check<V>(index: &BlockIndex<V>) -> Result<(), InvariantViolation> {
    let Some(root) = index.root() else {
        return Ok(());
    };
    let root_node = index.slot(root).ok_or(InvariantViolation::DanglingLink { slot: root })?;
    if root_node.color == Color::Red {
        return Err(InvariantViolation::RedRoot);
    }
    if root_node.parent.is_some() {
        return Err(InvariantViolation::BrokenParentLink { key: root_node.key });
    }
    subtree(index, root, None, None).map(|_| ())
}

/// Summary of a checked subtree.
struct Checked {
    black_height: usize,
    count: usize,
}

/// Check the subtree at `id`, whose keys must lie strictly between
/// `lower` and `upper`.
fn subtree<V>(
    index: &BlockIndex<V>,
    id: NodeId,
    lower: Option<i64>,
    upper: Option<i64>,
) -> Result<Checked, InvariantViolation> {
    let node = index.slot(id).ok_or(InvariantViolation::DanglingLink { slot: id })?;
    let key = node.key;

    if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
        return Err(InvariantViolation::OutOfOrder { key });
    }

    let is_red = |child: Option<NodeId>| {
        child
            .and_then(|c| index.slot(c))
            .is_some_and(|n| n.color == Color::Red)
    };
    if is_red(node.right) {
        return Err(InvariantViolation::RightLeaningRed { key });
    }
    if node.color == Color::Red && is_red(node.left) {
        return Err(InvariantViolation::ConsecutiveRed { key });
    }

    let left = linked_child(index, id, node.left, lower, Some(key))?;
    let right = linked_child(index, id, node.right, Some(key), upper)?;

    if left.black_height != right.black_height {
        return Err(InvariantViolation::BlackHeightMismatch {
            key,
            left: left.black_height,
            right: right.black_height,
        });
    }
    let actual = left.count + right.count + 1;
    if node.count != actual {
        return Err(InvariantViolation::CountMismatch {
            key,
            stored: node.count,
            actual,
        });
    }

    let own = usize::from(node.color == Color::Black);
    Ok(Checked {
        black_height: left.black_height + own,
        count: actual,
    })
}

/// Check the link from `parent` to `child`, then the child's subtree.
fn linked_child<V>(
    index: &BlockIndex<V>,
    parent: NodeId,
    child: Option<NodeId>,
    lower: Option<i64>,
    upper: Option<i64>,
) -> Result<Checked, InvariantViolation> {
    let Some(c) = child else {
        return Ok(Checked {
            black_height: 0,
            count: 0,
        });
    };
    let node = index.slot(c).ok_or(InvariantViolation::DanglingLink { slot: c })?;
    if node.parent != Some(parent) {
        return Err(InvariantViolation::BrokenParentLink { key: node.key });
    }
    subtree(index, c, lower, upper)
}
