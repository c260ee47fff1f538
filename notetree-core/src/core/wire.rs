//! Request and response shapes exchanged with the note backend.
//!
//! The backend persists tree nodes as flat rows keyed by group ("folder")
//! and parent, and serves them back grouped by link label
//! (`"/costs/" → [group marker with nested items]`). This module holds both
//! shapes and the conversions between them and a [`Tree`].

use crate::{note_link, Tree, TreeNode};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Body of the "add tree node" call: one flat row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTreeNodeRequest {
    pub id: String,
    #[serde(rename = "folderId")]
    pub folder_id: Option<String>,
    pub text: String,
    pub parent_id: Option<String>,
    #[serde(rename = "noteId")]
    pub note_id: Option<String>,
    pub sort: f64,
}

impl From<&TreeNode> for AddTreeNodeRequest {
    fn from(node: &TreeNode) -> Self {
        Self {
            id: node.id.clone(),
            folder_id: node.folder_id.clone(),
            text: node.text.clone(),
            parent_id: node.parent_id.clone(),
            note_id: node.note_id.clone(),
            sort: node.sort,
        }
    }
}

/// Body of the "add folder" and "rename folder" calls: one top-level group record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderRequest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(rename = "linkTxt")]
    pub link_txt: Option<String>,
}

impl From<&TreeNode> for FolderRequest {
    fn from(marker: &TreeNode) -> Self {
        Self {
            id: marker.id.clone(),
            title: marker.text.clone(),
            parent_id: None,
            link_txt: marker.link_txt.clone(),
        }
    }
}

/// The grouped tree as served by the backend, in document order.
///
/// Each entry maps a group key (`"/costs/"`) to that group's node list.
/// Serialized as a JSON object; entry order is preserved on both sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarGroups(pub Vec<(String, Vec<TreeNode>)>);

impl SidebarGroups {
    /// Concatenates every group into one top-level sequence and marks the
    /// first node of each group as the group marker.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        let mut roots = Vec::new();
        for (key, mut nodes) in self.0 {
            let Some(first) = nodes.first_mut() else {
                log::debug!("skipping empty group {key}");
                continue;
            };
            first.is_top = true;
            roots.extend(nodes.into_iter().map(Arc::new));
        }
        Tree::from_shared(roots)
    }

    /// Number of groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SidebarGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, nodes) in &self.0 {
            map.serialize_entry(key, nodes)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SidebarGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> Visitor<'de> for GroupsVisitor {
            type Value = SidebarGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map from group key to a list of tree nodes")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> std::result::Result<Self::Value, M::Error> {
                let mut groups = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, nodes)) = access.next_entry::<String, Vec<TreeNode>>()? {
                    groups.push((key, nodes));
                }
                Ok(SidebarGroups(groups))
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Flattens a snapshot into the records the backend stores: one
/// [`FolderRequest`] per group marker and one [`AddTreeNodeRequest`] per other node.
#[must_use]
pub fn rows_from_tree(tree: &Tree) -> (Vec<FolderRequest>, Vec<AddTreeNodeRequest>) {
    let mut folders = Vec::new();
    let mut rows = Vec::new();
    for node in tree.iter() {
        if node.is_top {
            folders.push(FolderRequest::from(node));
        } else {
            rows.push(AddTreeNodeRequest::from(node));
        }
    }
    (folders, rows)
}

/// Rebuilds the grouped fetch shape from stored records.
///
/// Each folder becomes a group marker keyed `/{link_txt}/` whose items are
/// the rows filed under it with no parent; deeper rows nest under their
/// `parent_id`. Siblings are ordered by `sort`. Rows with a note get a
/// `link`; rows with children are marked expanded.
#[must_use]
pub fn groups_from_rows(folders: &[FolderRequest], rows: &[AddTreeNodeRequest]) -> SidebarGroups {
    let mut groups: Vec<(String, Vec<TreeNode>)> = Vec::new();

    for (index, folder) in folders.iter().enumerate() {
        let link_txt = folder.link_txt.clone().unwrap_or_default();
        let members: Vec<&AddTreeNodeRequest> = rows
            .iter()
            .filter(|r| r.folder_id.as_deref() == Some(folder.id.as_str()))
            .collect();

        let marker = TreeNode {
            id: folder.id.clone(),
            text: folder.title.clone(),
            items: Some(nest(&members, None, &link_txt)),
            link_txt: Some(link_txt.clone()),
            folder_id: Some(folder.id.clone()),
            parent_id: None,
            sort: index as f64,
            ..TreeNode::default()
        };

        let key = format!("/{link_txt}/");
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, nodes)) => nodes.push(marker),
            None => groups.push((key, vec![marker])),
        }
    }

    for row in rows {
        let filed = folders.iter().any(|f| row.folder_id.as_deref() == Some(f.id.as_str()));
        if !filed {
            log::warn!("row {} is not filed under any folder and was left out", row.id);
        }
    }

    SidebarGroups(groups)
}

fn nest(rows: &[&AddTreeNodeRequest], parent: Option<&str>, link_txt: &str) -> Vec<Arc<TreeNode>> {
    let mut level: Vec<&AddTreeNodeRequest> = rows
        .iter()
        .copied()
        .filter(|r| r.parent_id.as_deref() == parent)
        .collect();
    level.sort_by(|a, b| a.sort.total_cmp(&b.sort));

    level
        .into_iter()
        .map(|row| {
            let children = nest(rows, Some(&row.id), link_txt);
            let has_children = !children.is_empty();
            Arc::new(TreeNode {
                id: row.id.clone(),
                text: row.text.clone(),
                items: has_children.then_some(children),
                link: row.note_id.as_deref().map(|n| note_link(link_txt, n)),
                link_txt: Some(link_txt.to_string()),
                folder_id: row.folder_id.clone(),
                note_id: row.note_id.clone(),
                parent_id: row.parent_id.clone(),
                sort: row.sort,
                is_top: false,
                collapsed: has_children.then(|| "false".to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const SIDEBAR: &str = r#"{
        "/costs/": [{
            "id": "f-costs", "sort": 0, "text": "Cost handbook", "link_txt": "costs",
            "folderId": "f-costs", "parent_id": null,
            "items": [
                {"id": "n1", "sort": 1.0, "text": "Intro", "link_txt": "costs",
                 "folderId": "f-costs", "parent_id": null, "noteId": "note-1", "link": "/costs/note-1"},
                {"id": "n2", "sort": 2.0, "text": "Chapter", "link_txt": "costs",
                 "folderId": "f-costs", "parent_id": null, "noteId": null, "collapsed": "false",
                 "items": [
                    {"id": "n3", "sort": 2.0001, "text": "Part A", "link_txt": "costs",
                     "folderId": "f-costs", "parent_id": "n2", "noteId": "note-3", "link": "/costs/note-3"}
                 ]}
            ]
        }],
        "/designs/": [{
            "id": "f-designs", "sort": 1, "text": "Design handbook", "items": [],
            "link_txt": "designs", "folderId": "f-designs", "parent_id": null
        }]
    }"#;

    type Signature = (String, String, Option<String>, Option<String>, Option<String>, u64, bool);

    fn signature(tree: &Tree) -> BTreeSet<Signature> {
        tree.iter()
            .map(|n| {
                (
                    n.id.clone(),
                    n.text.clone(),
                    n.parent_id.clone(),
                    n.folder_id.clone(),
                    n.note_id.clone(),
                    n.sort.to_bits(),
                    n.is_top,
                )
            })
            .collect()
    }

    #[test]
    fn test_groups_keep_document_order() {
        let groups: SidebarGroups = serde_json::from_str(SIDEBAR).unwrap();
        let keys: Vec<_> = groups.0.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["/costs/", "/designs/"]);
    }

    #[test]
    fn test_into_tree_marks_group_markers() {
        let groups: SidebarGroups = serde_json::from_str(SIDEBAR).unwrap();
        let tree = groups.into_tree();
        let roots = tree.roots();
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|r| r.is_top));
        assert!(!tree.find("n1").unwrap().is_top);
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_serialize_groups_as_object() {
        let groups = SidebarGroups(vec![("/a/".to_string(), vec![TreeNode::folder("A")])]);
        let value = serde_json::to_value(&groups).unwrap();
        assert!(value.get("/a/").unwrap().is_array());
    }

    #[test]
    fn test_add_request_field_names() {
        let node = TreeNode {
            id: "x".to_string(),
            text: "X".to_string(),
            folder_id: Some("f".to_string()),
            note_id: Some("note".to_string()),
            sort: 1.5,
            ..TreeNode::default()
        };
        let json = serde_json::to_value(AddTreeNodeRequest::from(&node)).unwrap();
        assert_eq!(json["folderId"], "f");
        assert_eq!(json["noteId"], "note");
        assert!(json["parent_id"].is_null());
        assert_eq!(json["sort"], 1.5);
    }

    #[test]
    fn test_round_trip_through_stored_rows() {
        let groups: SidebarGroups = serde_json::from_str(SIDEBAR).unwrap();
        let tree = groups.into_tree();

        let (folders, rows) = rows_from_tree(&tree);
        assert_eq!(folders.len(), 2);
        assert_eq!(rows.len(), 3);

        let rebuilt = groups_from_rows(&folders, &rows).into_tree();
        assert_eq!(signature(&tree), signature(&rebuilt));
        assert_eq!(rebuilt.find("n3").unwrap().link.as_deref(), Some("/costs/note-3"));
    }

    #[test]
    fn test_rebuild_sorts_siblings() {
        let folders = vec![FolderRequest {
            id: "g".to_string(),
            title: "G".to_string(),
            parent_id: None,
            link_txt: Some("g".to_string()),
        }];
        let row = |id: &str, sort: f64| AddTreeNodeRequest {
            id: id.to_string(),
            folder_id: Some("g".to_string()),
            text: id.to_string(),
            parent_id: None,
            note_id: None,
            sort,
        };
        let rows = vec![row("late", 3.0), row("early", 1.0), row("mid", 2.0)];
        let tree = groups_from_rows(&folders, &rows).into_tree();
        let order: Vec<_> = tree.roots()[0].children().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(order, vec!["early", "mid", "late"]);
    }
}
