//! The tree view's command surface.
//!
//! [`TreeController`] turns user gestures (dialog confirmations, drops,
//! deletions) into [`TreeEdit`]s, decides sort keys and parentage for new
//! nodes, and hands each edit to [`RemoteSync`]. Other UI regions reach the
//! tree only through the command methods here.

use crate::{
    child_sort, is_exhausted, note_link, sort_after, sort_before, DataSourceItem, DropPosition, FolderRequest,
    NoteTreeError, Placement, RemoteSync, Result, Tree, TreeAuthority, TreeEdit, TreeNode,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// What the add/rename dialog was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogMode {
    Child,
    Sibling,
    Rename,
}

/// Fields entered in the add/rename dialog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    pub title: String,
    /// Link label; only read when the target is a top-level group marker.
    #[serde(default)]
    pub link_txt: Option<String>,
}

impl NodeInput {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link_txt: None,
        }
    }

    #[must_use]
    pub fn with_link(title: impl Into<String>, link_txt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link_txt: Some(link_txt.into()),
        }
    }

    /// Returns the trimmed title and link label, or a validation error.
    ///
    /// A link label is required when the dialog adds a sibling group to, or
    /// renames, a top-level group marker.
    pub fn validate(&self, mode: DialogMode, target: &TreeNode) -> Result<(String, Option<String>)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(NoteTreeError::Validation("A name is required".to_string()));
        }
        let link_txt = self
            .link_txt
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        if target.is_top && mode != DialogMode::Child && link_txt.is_none() {
            return Err(NoteTreeError::Validation(
                "A link label is required for a top-level group".to_string(),
            ));
        }
        Ok((title.to_string(), link_txt))
    }
}

/// Whether a node has an edit waiting for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditPhase {
    Idle,
    AwaitingServer,
}

/// Command interface over the document tree.
pub struct TreeController<A> {
    sync: RemoteSync<A>,
    in_flight: Mutex<HashMap<String, usize>>,
}

impl<A: TreeAuthority> TreeController<A> {
    pub fn new(sync: RemoteSync<A>) -> Self {
        Self {
            sync,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn sync(&self) -> &RemoteSync<A> {
        &self.sync
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Tree {
        self.sync.snapshot()
    }

    /// Fetches the tree from the server.
    pub fn load(&self) -> Result<Tree> {
        self.sync.reload()
    }

    /// [`EditPhase::AwaitingServer`] while any edit anchored at `node_id` is outstanding.
    pub fn phase(&self, node_id: &str) -> EditPhase {
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight.get(node_id).copied().unwrap_or(0) > 0 {
            EditPhase::AwaitingServer
        } else {
            EditPhase::Idle
        }
    }

    /// Files `item` in the tree at `position` relative to `target_id`.
    ///
    /// Drops onto a group marker always file inside the group.
    pub fn add_node(&self, item: &DataSourceItem, target_id: &str, position: DropPosition) -> Result<Tree> {
        let tree = self.snapshot();
        let target = self.target(&tree, target_id)?;
        let position = if target.is_top && position != DropPosition::Child {
            log::debug!("drop next to group marker {target_id} filed inside it");
            DropPosition::Child
        } else {
            position
        };

        let leaf = filed_leaf(item, &target);
        let edit = match position {
            DropPosition::Child => place_child(&target, leaf),
            DropPosition::Top => {
                let (prev, _) = neighbour_sorts(&tree, target_id);
                let sort = sort_before(prev, target.sort);
                warn_if_exhausted(prev, target.sort);
                place_sibling(&target, leaf, sort, Placement::Before {
                    reference_id: target.id.clone(),
                })
            }
            DropPosition::Bottom => {
                let (_, next) = neighbour_sorts(&tree, target_id);
                let sort = sort_after(target.sort, next);
                warn_if_exhausted(next, target.sort);
                place_sibling(&target, leaf, sort, Placement::After {
                    reference_id: target.id.clone(),
                })
            }
        };
        self.run(target_id, edit)
    }

    /// Files `item` at the end of the last group's top level.
    ///
    /// Every stored node belongs to a group, so a drop on the empty area of
    /// the tree lands in the last group. Fails with a validation error when
    /// there is no group at all.
    pub fn add_to_root(&self, item: &DataSourceItem) -> Result<Tree> {
        let tree = self.snapshot();
        let Some(group) = tree.roots().iter().rev().find(|r| r.is_top) else {
            let e = NoteTreeError::Validation("There is no group to file the item into".to_string());
            log::debug!("root drop of {} with no group", item.id);
            self.sync.report_failure(&e);
            return Err(e);
        };
        let group = TreeNode::clone(group);
        let edit = place_child(&group, filed_leaf(item, &group));
        self.run(&group.id, edit)
    }

    /// Deletes `node_id` with its subtree. Deleting a group marker deletes the group.
    pub fn remove_node(&self, node_id: &str) -> Result<Tree> {
        let tree = self.snapshot();
        let target = self.target(&tree, node_id)?;
        self.run(node_id, TreeEdit::RemoveNode {
            id: target.id.clone(),
            is_folder: target.is_top,
        })
    }

    /// Confirms the add/rename dialog opened on `target_id`.
    pub fn confirm(&self, mode: DialogMode, target_id: &str, input: &NodeInput) -> Result<Tree> {
        let tree = self.snapshot();
        let target = self.target(&tree, target_id)?;
        let (title, link_txt) = input.validate(mode, &target).inspect_err(|e| {
            log::debug!("dialog input rejected: {e}");
            self.sync.report_failure(e);
        })?;

        let edit = match mode {
            DialogMode::Child => {
                let node = TreeNode {
                    id: TreeNode::new_id(),
                    text: title,
                    items: Some(Vec::new()),
                    link_txt: target.link_txt.clone(),
                    ..TreeNode::default()
                };
                place_child(&target, node)
            }
            DialogMode::Sibling if target.is_top => {
                let (_, next) = neighbour_sorts(&tree, target_id);
                let id = TreeNode::new_id();
                let marker = TreeNode {
                    id: id.clone(),
                    text: title,
                    items: Some(Vec::new()),
                    link_txt,
                    folder_id: Some(id),
                    sort: sort_after(target.sort, next),
                    is_top: true,
                    ..TreeNode::default()
                };
                TreeEdit::AddGroup {
                    folder: FolderRequest::from(&marker),
                    node: marker,
                    after: target.id.clone(),
                }
            }
            DialogMode::Sibling => {
                let (_, next) = neighbour_sorts(&tree, target_id);
                let node = TreeNode {
                    id: TreeNode::new_id(),
                    text: title,
                    items: Some(Vec::new()),
                    link_txt: target.link_txt.clone(),
                    ..TreeNode::default()
                };
                place_sibling(&target, node, sort_after(target.sort, next), Placement::After {
                    reference_id: target.id.clone(),
                })
            }
            DialogMode::Rename if target.is_top => TreeEdit::RenameGroup {
                id: target.id.clone(),
                title,
                link_txt,
            },
            DialogMode::Rename => TreeEdit::RenameNode {
                id: target.id.clone(),
                text: title,
            },
        };
        self.run(target_id, edit)
    }

    pub fn add_child(&self, target_id: &str, title: &str) -> Result<Tree> {
        self.confirm(DialogMode::Child, target_id, &NodeInput::titled(title))
    }

    pub fn add_sibling(&self, target_id: &str, input: &NodeInput) -> Result<Tree> {
        self.confirm(DialogMode::Sibling, target_id, input)
    }

    pub fn rename(&self, target_id: &str, input: &NodeInput) -> Result<Tree> {
        self.confirm(DialogMode::Rename, target_id, input)
    }

    fn target(&self, tree: &Tree, node_id: &str) -> Result<TreeNode> {
        match tree.find(node_id) {
            Some(node) => Ok(node.clone()),
            None => {
                let e = NoteTreeError::NodeNotFound(node_id.to_string());
                self.sync.report_failure(&e);
                Err(e)
            }
        }
    }

    fn run(&self, key: &str, edit: TreeEdit) -> Result<Tree> {
        let _guard = InFlight::enter(&self.in_flight, key);
        self.sync.commit(edit)
    }
}

/// Marks `key` as awaiting the server until dropped.
struct InFlight<'a> {
    counts: &'a Mutex<HashMap<String, usize>>,
    key: String,
}

impl<'a> InFlight<'a> {
    fn enter(counts: &'a Mutex<HashMap<String, usize>>, key: &str) -> Self {
        *counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.to_string())
            .or_insert(0) += 1;
        Self {
            counts,
            key: key.to_string(),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(n) = counts.get_mut(&self.key) {
            *n -= 1;
            if *n == 0 {
                counts.remove(&self.key);
            }
        }
    }
}

/// Leaf for a note dropped from the data-source panel onto `target`'s group.
fn filed_leaf(item: &DataSourceItem, target: &TreeNode) -> TreeNode {
    TreeNode {
        id: TreeNode::new_id(),
        text: item.text.clone(),
        link: target.link_txt.as_deref().map(|l| note_link(l, &item.id)),
        link_txt: target.link_txt.clone(),
        note_id: Some(item.id.clone()),
        ..TreeNode::default()
    }
}

/// Appends `node` under `target`. Children of a group marker are filed with no parent.
fn place_child(target: &TreeNode, mut node: TreeNode) -> TreeEdit {
    node.parent_id = (!target.is_top).then(|| target.id.clone());
    node.folder_id = target.folder_id.clone();
    node.sort = child_sort(target);
    TreeEdit::AddNode {
        node,
        placement: Placement::Child {
            parent_id: target.id.clone(),
        },
    }
}

fn place_sibling(target: &TreeNode, mut node: TreeNode, sort: f64, placement: Placement) -> TreeEdit {
    node.parent_id = target.parent_id.clone();
    node.folder_id = target.folder_id.clone();
    node.sort = sort;
    TreeEdit::AddNode { node, placement }
}

/// Sort keys of the siblings directly before and after `node_id`.
fn neighbour_sorts(tree: &Tree, node_id: &str) -> (Option<f64>, Option<f64>) {
    tree.siblings_of(node_id)
        .map(|(list, i)| {
            let prev = i.checked_sub(1).map(|p| list[p].sort);
            let next = list.get(i + 1).map(|n| n.sort);
            (prev, next)
        })
        .unwrap_or((None, None))
}

fn warn_if_exhausted(neighbour: Option<f64>, reference: f64) {
    if let Some(n) = neighbour {
        if is_exhausted(n, reference) {
            log::warn!("no sort key left between {n} and {reference}");
        }
    }
}
