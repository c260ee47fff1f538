//! Fractional sort keys for sibling ordering.
//!
//! Keys are plain `f64` values. A new node gets a key derived from its
//! neighbours, so inserting never renumbers unrelated siblings. Repeated
//! insertion into the same gap eventually runs out of representable values;
//! [`is_exhausted`] detects that, and nothing rebalances.

use crate::TreeNode;

/// Step used when appending a child after the parent's last child.
pub const CHILD_EPSILON: f64 = 1e-4;

/// Step used when inserting next to a sibling. Coarser than [`CHILD_EPSILON`]
/// so that children appended under the new node still fit before its next sibling.
pub const SIBLING_EPSILON: f64 = 1e-3;

/// Key for a child appended at the end of `parent`'s children.
#[must_use]
pub fn child_sort(parent: &TreeNode) -> f64 {
    parent.last_child_sort().unwrap_or(parent.sort) + CHILD_EPSILON
}

/// Key for a node placed directly after a sibling keyed `reference`.
///
/// `next` is the key of the sibling that currently follows `reference`, if any.
#[must_use]
pub fn sort_after(reference: f64, next: Option<f64>) -> f64 {
    let candidate = reference + SIBLING_EPSILON;
    match next {
        Some(next) if candidate >= next => midpoint(reference, next),
        _ => candidate,
    }
}

/// Key for a node placed directly before a sibling keyed `reference`.
///
/// `prev` is the key of the sibling that currently precedes `reference`, if any.
#[must_use]
pub fn sort_before(prev: Option<f64>, reference: f64) -> f64 {
    let candidate = reference - SIBLING_EPSILON;
    match prev {
        Some(prev) if candidate <= prev => midpoint(prev, reference),
        _ => candidate,
    }
}

/// `true` when no `f64` lies strictly between `a` and `b`.
#[must_use]
pub fn is_exhausted(a: f64, b: f64) -> bool {
    let m = midpoint(a, b);
    m <= a.min(b) || m >= a.max(b)
}

fn midpoint(a: f64, b: f64) -> f64 {
    a + (b - a) / 2.0
}
