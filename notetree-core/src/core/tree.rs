//! Immutable tree snapshots and the structural edits over them.
//!
//! A [`Tree`] is a value: every edit returns a new snapshot and leaves the
//! receiver untouched. All edits go through one locate-and-transform
//! traversal ([`splice`]) that finds the sibling list holding a node and
//! rebuilds only the path from that list up to the roots; every other
//! subtree is shared with the previous snapshot.
//!
//! An edit that names an unknown ID returns the receiver itself. Use
//! [`Tree::is_same`] to tell "nothing happened" apart from a real change.

use crate::TreeNode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One snapshot of the whole document tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    roots: Arc<Vec<Arc<TreeNode>>>,
}

/// The outcome of removing a node from a [`Tree`].
///
/// # Examples
///
/// ```rust
/// use notetree_core::RemoveResult;
///
/// let result = RemoveResult {
///     removed_count: 2,
///     removed_ids: vec!["folder".to_string(), "leaf".to_string()],
/// };
/// let json = serde_json::to_string(&result).unwrap();
/// assert!(json.contains("removedCount"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResult {
    /// Number of nodes that left the tree (the node plus its descendants).
    pub removed_count: usize,

    /// IDs of every removed node, in pre-order.
    pub removed_ids: Vec<String>,
}

impl Tree {
    /// Builds a snapshot from owned root nodes.
    #[must_use]
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self::from_shared(roots.into_iter().map(Arc::new).collect())
    }

    /// Builds a snapshot from already shared root nodes.
    #[must_use]
    pub fn from_shared(roots: Vec<Arc<TreeNode>>) -> Self {
        Self {
            roots: Arc::new(roots),
        }
    }

    /// Top-level nodes in display order.
    #[must_use]
    pub fn roots(&self) -> &[Arc<TreeNode>] {
        &self.roots
    }

    /// `true` when both values are the very same snapshot (not merely equal).
    #[must_use]
    pub fn is_same(&self, other: &Tree) -> bool {
        Arc::ptr_eq(&self.roots, &other.roots)
    }

    /// Total number of nodes at every depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterates over every node in depth-first pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        let mut out = Vec::new();
        collect_preorder(&self.roots, &mut out);
        out.into_iter()
    }

    /// IDs of every node in depth-first pre-order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.iter().map(|n| n.id.clone()).collect()
    }

    /// IDs of the nodes the backend asked to show expanded, in pre-order.
    #[must_use]
    pub fn expanded_ids(&self) -> Vec<String> {
        self.iter().filter(|n| n.is_expanded()).map(|n| n.id.clone()).collect()
    }

    /// Depth-first search for `node_id`.
    #[must_use]
    pub fn find(&self, node_id: &str) -> Option<&TreeNode> {
        find_in(&self.roots, node_id)
    }

    #[must_use]
    pub fn contains(&self, node_id: &str) -> bool {
        self.find(node_id).is_some()
    }

    /// Returns the sibling list holding `node_id` and the node's index in it.
    #[must_use]
    pub fn siblings_of(&self, node_id: &str) -> Option<(&[Arc<TreeNode>], usize)> {
        siblings_in(&self.roots, node_id)
    }

    /// Appends `node` to the children of `parent_id`, turning a leaf into a folder if needed.
    #[must_use]
    pub fn insert_child(&self, parent_id: &str, node: TreeNode) -> Tree {
        self.update(parent_id, move |parent| {
            parent.items.get_or_insert_with(Vec::new).push(Arc::new(node));
        })
    }

    /// Places `node` immediately before `reference_id` in the same sibling list.
    #[must_use]
    pub fn insert_before(&self, reference_id: &str, node: TreeNode) -> Tree {
        self.edit_list(reference_id, move |list, i| list.insert(i, Arc::new(node)))
    }

    /// Places `node` immediately after `reference_id` in the same sibling list.
    #[must_use]
    pub fn insert_after(&self, reference_id: &str, node: TreeNode) -> Tree {
        self.edit_list(reference_id, move |list, i| list.insert(i + 1, Arc::new(node)))
    }

    /// Removes `node_id` and its whole subtree.
    #[must_use]
    pub fn remove(&self, node_id: &str) -> Tree {
        self.remove_collect(node_id).0
    }

    /// Removes `node_id` and its whole subtree, reporting which IDs went with it.
    ///
    /// The result is `None` (and the snapshot unchanged) when `node_id` is absent.
    #[must_use]
    pub fn remove_collect(&self, node_id: &str) -> (Tree, Option<RemoveResult>) {
        let mut removed: Option<Arc<TreeNode>> = None;
        let tree = self.edit_list(node_id, |list, i| removed = Some(list.remove(i)));
        let result = removed.map(|node| {
            let mut nodes = Vec::new();
            collect_preorder(std::slice::from_ref(&node), &mut nodes);
            let removed_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
            RemoveResult {
                removed_count: removed_ids.len(),
                removed_ids,
            }
        });
        (tree, result)
    }

    /// Replaces the display label of `node_id`.
    #[must_use]
    pub fn rename(&self, node_id: &str, text: &str) -> Tree {
        let text = text.to_string();
        self.update(node_id, move |node| node.text = text)
    }

    /// Applies `f` to a private copy of `node_id` and publishes it in a new snapshot.
    #[must_use]
    pub fn update(&self, node_id: &str, f: impl FnOnce(&mut TreeNode)) -> Tree {
        self.edit_list(node_id, move |list, i| f(Arc::make_mut(&mut list[i])))
    }

    fn edit_list(
        &self,
        node_id: &str,
        f: impl FnOnce(&mut Vec<Arc<TreeNode>>, usize),
    ) -> Tree {
        let mut f = Some(f);
        match splice(&self.roots, node_id, &mut f) {
            Some(roots) => Tree::from_shared(roots),
            None => self.clone(),
        }
    }
}

/// Locates the sibling list that contains `node_id`, hands a copy of it to
/// `f`, and rebuilds the ancestors above it. Returns `None` when the ID is absent.
fn splice<F>(list: &[Arc<TreeNode>], node_id: &str, f: &mut Option<F>) -> Option<Vec<Arc<TreeNode>>>
where
    F: FnOnce(&mut Vec<Arc<TreeNode>>, usize),
{
    if let Some(i) = list.iter().position(|n| n.id == node_id) {
        let mut out = list.to_vec();
        let f = f.take()?;
        f(&mut out, i);
        return Some(out);
    }

    for (i, node) in list.iter().enumerate() {
        let Some(items) = node.items.as_deref() else {
            continue;
        };
        if let Some(new_items) = splice(items, node_id, f) {
            let mut out = list.to_vec();
            Arc::make_mut(&mut out[i]).items = Some(new_items);
            return Some(out);
        }
    }
    None
}

fn find_in<'a>(list: &'a [Arc<TreeNode>], node_id: &str) -> Option<&'a TreeNode> {
    for node in list {
        if node.id == node_id {
            return Some(&**node);
        }
        if let Some(found) = find_in(node.children(), node_id) {
            return Some(found);
        }
    }
    None
}

fn siblings_in<'a>(list: &'a [Arc<TreeNode>], node_id: &str) -> Option<(&'a [Arc<TreeNode>], usize)> {
    if let Some(i) = list.iter().position(|n| n.id == node_id) {
        return Some((list, i));
    }
    list.iter().find_map(|n| siblings_in(n.children(), node_id))
}

fn collect_preorder<'a>(list: &'a [Arc<TreeNode>], out: &mut Vec<&'a TreeNode>) {
    for node in list {
        out.push(&**node);
        collect_preorder(node.children(), out);
    }
}
