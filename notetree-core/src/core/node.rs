//! The [`TreeNode`] value that every snapshot is built from.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One node of the document hierarchy: a folder, a bookmark, or a top-level group marker.
///
/// Field names on the wire follow the backend (`folderId`, `noteId`,
/// `parent_id`, `isTop`, ...). Children are reference-counted so that
/// snapshots produced by an edit share every subtree the edit did not touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Stable identifier, assigned once at creation.
    pub id: String,
    /// Display label.
    #[serde(default)]
    pub text: String,
    /// Ordered children. `Some` (even when empty) marks a folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Arc<TreeNode>>>,
    /// Route to the referenced note, e.g. `/costs/<note id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Link label of the group this node belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_txt: Option<String>,
    /// Group (folder record) this node is filed under.
    #[serde(rename = "folderId", default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    /// Externally stored note content this node points at.
    #[serde(rename = "noteId", default, skip_serializing_if = "Option::is_none")]
    pub note_id: Option<String>,
    /// Parent node; `None` for nodes attached directly under a group.
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Fractional ordering key among siblings.
    #[serde(default)]
    pub sort: f64,
    /// First node of a top-level group.
    #[serde(rename = "isTop", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_top: bool,
    /// `"false"` when the node should render expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<String>,
}

impl TreeNode {
    /// Generates a fresh random node ID.
    #[must_use]
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Creates an empty folder node with a fresh ID.
    #[must_use]
    pub fn folder(text: impl Into<String>) -> Self {
        Self {
            id: Self::new_id(),
            text: text.into(),
            items: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// `true` when the node carries a child list, even an empty one.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.items.is_some()
    }

    /// `true` when the node links to a note. Drop targets use this to decide
    /// between sibling and child placement.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.link.is_some()
    }

    /// Children in sibling order; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Arc<TreeNode>] {
        self.items.as_deref().unwrap_or(&[])
    }

    /// Sort key of the last child, if any.
    #[must_use]
    pub fn last_child_sort(&self) -> Option<f64> {
        self.children().last().map(|c| c.sort)
    }

    /// `true` when the backend asked for the node to be shown expanded.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.collapsed.as_deref() == Some("false")
    }

    /// This node and every descendant, depth-first pre-order.
    #[must_use]
    pub fn subtree(&self) -> Vec<&TreeNode> {
        let mut out = vec![self];
        for child in self.children() {
            out.extend(child.subtree());
        }
        out
    }
}

/// Builds the route of a note inside a group: `/{link_txt}/{note_id}`.
#[must_use]
pub fn note_link(link_txt: &str, note_id: &str) -> String {
    format!("/{}/{}", link_txt.trim_matches('/'), note_id)
}
