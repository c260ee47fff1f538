//! Filing unfiled notes into the tree by drag and drop, and back out again.

use crate::{DataSource, DataSourceItem, DropIntent, NoteTreeError, Result, Tree, TreeAuthority, TreeController};

/// The sorting screen: the tree on one side, the unfiled notes on the other.
///
/// Moves are pessimistic in both directions. An item leaves the panel only
/// after the tree edit that files it is confirmed, and a node reappears in
/// the panel only after its removal from the tree is confirmed.
pub struct SortingWorkspace<A> {
    tree: TreeController<A>,
    source: DataSource<A>,
}

impl<A: TreeAuthority> SortingWorkspace<A> {
    pub fn new(tree: TreeController<A>, source: DataSource<A>) -> Self {
        Self { tree, source }
    }

    pub fn tree(&self) -> &TreeController<A> {
        &self.tree
    }

    pub fn source(&self) -> &DataSource<A> {
        &self.source
    }

    /// Loads the tree and the panel.
    pub fn load(&self) -> Result<()> {
        self.tree.load()?;
        self.source.load()?;
        Ok(())
    }

    /// Files a panel item at a resolved drop position in the tree.
    pub fn drop_on_node(&self, item_id: &str, intent: &DropIntent) -> Result<Tree> {
        let item = self.panel_item(item_id)?;
        let tree = self
            .tree
            .add_node(&item, &intent.target_id, intent.position)?;
        self.source.take(item_id);
        Ok(tree)
    }

    /// Files a panel item at the end of the last group, for drops on the empty tree area.
    pub fn drop_on_root(&self, item_id: &str) -> Result<Tree> {
        let item = self.panel_item(item_id)?;
        let tree = self.tree.add_to_root(&item)?;
        self.source.take(item_id);
        Ok(tree)
    }

    /// Removes a node with its subtree from the tree and returns every note
    /// in that subtree to the panel. Folders without a note are dropped.
    pub fn drop_on_data_source(&self, node_id: &str) -> Result<Tree> {
        let snapshot = self.tree.snapshot();
        let Some(node) = snapshot.find(node_id) else {
            log::warn!("dragged node {node_id} is not in the tree");
            return Err(self.unknown(node_id));
        };
        let returned: Vec<DataSourceItem> = node
            .subtree()
            .into_iter()
            .filter_map(DataSourceItem::from_node)
            .collect();
        let tree = self.tree.remove_node(node_id)?;
        log::debug!("returning {} notes to the panel", returned.len());
        for item in returned {
            self.source.push(item);
        }
        Ok(tree)
    }

    fn panel_item(&self, item_id: &str) -> Result<DataSourceItem> {
        self.source.get(item_id).ok_or_else(|| {
            log::warn!("dropped item {item_id} is not in the panel");
            self.unknown(item_id)
        })
    }

    fn unknown(&self, id: &str) -> NoteTreeError {
        let e = NoteTreeError::NodeNotFound(id.to_string());
        self.tree.sync().report_failure(&e);
        e
    }
}
