//! Structural and content edits that travel through the remote authority.

use crate::{note_link, FolderRequest, Tree, TreeNode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a new node goes relative to an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Placement {
    /// Appended to the children of `parent_id`.
    Child { parent_id: String },
    /// Directly before `reference_id`, in the same sibling list.
    Before { reference_id: String },
    /// Directly after `reference_id`, in the same sibling list.
    After { reference_id: String },
}

impl Placement {
    /// The node the placement is relative to.
    #[must_use]
    pub fn anchor_id(&self) -> &str {
        match self {
            Self::Child { parent_id } => parent_id.as_str(),
            Self::Before { reference_id } | Self::After { reference_id } => reference_id.as_str(),
        }
    }
}

/// One edit the server must confirm before it appears in the local snapshot.
///
/// Each variant maps to exactly one authority call (see
/// [`RemoteSync::commit`](crate::RemoteSync::commit)) and to exactly one
/// snapshot transformation ([`TreeEdit::apply_to`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TreeEdit {
    /// A node was added under or next to an existing node.
    AddNode {
        /// The complete new node.
        node: TreeNode,
        /// Where it goes.
        placement: Placement,
    },
    /// A new top-level group was created after an existing one.
    AddGroup {
        /// Folder record sent to the server.
        folder: FolderRequest,
        /// Group marker inserted into the tree.
        node: TreeNode,
        /// ID of the group marker the new group follows.
        after: String,
    },
    /// A node and its subtree were deleted.
    RemoveNode {
        /// ID of the deleted node.
        id: String,
        /// `true` when the node is a group marker and the whole group goes.
        is_folder: bool,
    },
    /// A node's label changed.
    RenameNode {
        /// ID of the renamed node.
        id: String,
        /// New label.
        text: String,
    },
    /// A group marker's title and link label changed.
    RenameGroup {
        /// ID of the group marker.
        id: String,
        /// New title.
        title: String,
        /// New link label.
        link_txt: Option<String>,
    },
}

impl TreeEdit {
    /// Short name of the edit, used in log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddNode { .. } => "add_node",
            Self::AddGroup { .. } => "add_group",
            Self::RemoveNode { .. } => "remove_node",
            Self::RenameNode { .. } => "rename_node",
            Self::RenameGroup { .. } => "rename_group",
        }
    }

    /// The existing node the edit depends on, if any.
    ///
    /// If this node is gone from the snapshot when the server's answer
    /// arrives, the edit cannot be placed.
    #[must_use]
    pub fn anchor_id(&self) -> Option<&str> {
        match self {
            Self::AddNode { placement, .. } => Some(placement.anchor_id()),
            Self::AddGroup { after, .. } => Some(after.as_str()),
            Self::RemoveNode { id, .. } | Self::RenameNode { id, .. } | Self::RenameGroup { id, .. } => Some(id.as_str()),
        }
    }

    /// Applies the edit to `tree`, returning the new snapshot.
    ///
    /// Returns `tree` itself (see [`Tree::is_same`]) when the anchor is missing.
    #[must_use]
    pub fn apply_to(&self, tree: &Tree) -> Tree {
        match self {
            Self::AddNode { node, placement } => match placement {
                Placement::Child { parent_id } => tree.insert_child(parent_id, node.clone()),
                Placement::Before { reference_id } => tree.insert_before(reference_id, node.clone()),
                Placement::After { reference_id } => tree.insert_after(reference_id, node.clone()),
            },
            Self::AddGroup { node, after, .. } => tree.insert_after(after, node.clone()),
            Self::RemoveNode { id, .. } => tree.remove(id),
            Self::RenameNode { id, text } => tree.rename(id, text),
            Self::RenameGroup { id, title, link_txt } => tree.update(id, |marker| {
                marker.text = title.clone();
                if marker.link_txt != *link_txt {
                    marker.link_txt = link_txt.clone();
                    relabel(marker, link_txt.as_deref());
                }
            }),
        }
    }
}

/// Moves every descendant of a group marker to the marker's new link label.
fn relabel(node: &mut TreeNode, link_txt: Option<&str>) {
    let Some(items) = node.items.as_mut() else {
        return;
    };
    for child in items.iter_mut() {
        let child = Arc::make_mut(child);
        child.link_txt = link_txt.map(str::to_string);
        if let (Some(label), Some(note_id)) = (link_txt, child.note_id.as_deref()) {
            child.link = Some(note_link(label, note_id));
        }
        relabel(child, link_txt);
    }
}
