//! Pessimistic two-phase synchronisation with the remote authority.
//!
//! Every edit is sent to the server first. The local snapshot changes only
//! after the server answers with code 200, and then the edit is applied to
//! whatever snapshot is current at that moment, not the one the edit was
//! built from. A rejected or failed call leaves the snapshot exactly as it
//! was and raises one error notification. Nothing is retried.

use crate::{
    Ack, AddTreeNodeRequest, ClientConfig, FolderRequest, Notification, Notifier, NoteTreeError, Result, Tree, TreeAuthority,
    TreeEdit, GENERIC_FAILURE_MESSAGE,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Holds the one current [`Tree`] snapshot.
///
/// Readers get a cheap clone of the snapshot handle. Writers swap in a new
/// snapshot under the write lock; every swap bumps [`generation`](Self::generation).
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Tree>,
    generation: AtomicU64,
}

impl SnapshotStore {
    #[must_use]
    pub fn new(tree: Tree) -> Self {
        Self {
            current: RwLock::new(tree),
            generation: AtomicU64::new(0),
        }
    }

    /// The current snapshot.
    #[must_use]
    pub fn current(&self) -> Tree {
        // Snapshots are immutable values, so a poisoned lock still holds a whole tree.
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of snapshots published since construction.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replaces the snapshot unconditionally.
    pub fn replace(&self, tree: Tree) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = tree;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Derives the next snapshot from the current one under the write lock.
    ///
    /// `f` returns `None` to publish nothing. Returns the published snapshot.
    pub fn publish_with(&self, f: impl FnOnce(&Tree) -> Option<Tree>) -> Option<Tree> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = f(&current)?;
        *current = next.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);
        Some(next)
    }
}

/// Sends edits to a [`TreeAuthority`] and publishes the confirmed ones.
pub struct RemoteSync<A> {
    authority: A,
    store: Arc<SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    fallback_message: String,
}

impl<A: TreeAuthority> RemoteSync<A> {
    /// Creates a sync layer over an empty snapshot.
    pub fn new(authority: A, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_store(authority, notifier, Arc::new(SnapshotStore::default()))
    }

    /// Creates a sync layer publishing into an existing store.
    pub fn with_store(authority: A, notifier: Arc<dyn Notifier>, store: Arc<SnapshotStore>) -> Self {
        Self {
            authority,
            store,
            notifier,
            fallback_message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Creates a sync layer that reports failures with the configured fallback message.
    pub fn from_config(authority: A, notifier: Arc<dyn Notifier>, config: &ClientConfig) -> Self {
        Self::new(authority, notifier).with_fallback_message(config.fallback_error_message.clone())
    }

    /// Sets the message shown when a failure carries no server text.
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Tree {
        self.store.current()
    }

    /// Fetches the whole tree and replaces the snapshot with it.
    ///
    /// On failure the snapshot is kept and one error notification is raised.
    pub fn reload(&self) -> Result<Tree> {
        log::debug!("fetching tree");
        let fetched = self
            .authority
            .fetch_tree()
            .and_then(|envelope| envelope.into_data());
        match fetched {
            Ok(groups) => {
                let tree = groups.into_tree();
                log::info!(
                    "loaded tree with {} nodes, {} expanded",
                    tree.len(),
                    tree.expanded_ids().len()
                );
                self.store.replace(tree.clone());
                Ok(tree)
            }
            Err(e) => {
                log::debug!("tree fetch failed");
                self.report_failure(&e);
                Err(e)
            }
        }
    }

    /// Runs `edit` through both phases and returns the published snapshot.
    pub fn commit(&self, edit: TreeEdit) -> Result<Tree> {
        log::debug!("sending {} for {:?}", edit.kind(), edit.anchor_id());
        let ack = match self.send(&edit).and_then(Ack::accepted) {
            Ok(ack) => ack,
            Err(e) => {
                log::debug!("{} not confirmed", edit.kind());
                self.report_failure(&e);
                return Err(e);
            }
        };

        let published = self.store.publish_with(|current| {
            if let Some(anchor) = edit.anchor_id() {
                if !current.contains(anchor) {
                    return None;
                }
            }
            let next = edit.apply_to(current);
            (!next.is_same(current)).then_some(next)
        });

        match published {
            Some(tree) => {
                log::info!("{} applied", edit.kind());
                self.notifier.notify(Notification::success(ack.message));
                Ok(tree)
            }
            None => {
                let anchor = edit.anchor_id().unwrap_or_default().to_string();
                log::warn!("{} confirmed but {anchor} left the snapshot", edit.kind());
                let e = NoteTreeError::StaleSnapshot(anchor);
                self.report_failure(&e);
                Err(e)
            }
        }
    }

    /// Logs `error` and raises its error notification.
    ///
    /// Failures caught before any request are logged at debug level, remote
    /// ones at warn level.
    pub fn report_failure(&self, error: &NoteTreeError) {
        if error.is_local() {
            log::debug!("request not sent: {error}");
        } else {
            log::warn!("request failed: {error}");
        }
        self.notifier
            .notify(Notification::error(error.user_message_or(&self.fallback_message)));
    }

    fn send(&self, edit: &TreeEdit) -> Result<Ack> {
        match edit {
            TreeEdit::AddNode { node, .. } => self.authority.add_node(&AddTreeNodeRequest::from(node)),
            TreeEdit::AddGroup { folder, .. } => self.authority.add_folder(folder),
            TreeEdit::RemoveNode { id, is_folder } => self.authority.remove_node(id, *is_folder),
            TreeEdit::RenameNode { id, text } => self.authority.rename_node(id, text),
            TreeEdit::RenameGroup { id, title, link_txt } => self.authority.rename_folder(&FolderRequest {
                id: id.clone(),
                title: title.clone(),
                parent_id: None,
                link_txt: link_txt.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{member, single_group, MockAuthority};
    use crate::{NotificationLog, Placement, Severity, TreeNode};

    fn setup(children: Vec<TreeNode>) -> (RemoteSync<Arc<MockAuthority>>, Arc<MockAuthority>, Arc<NotificationLog>) {
        let mock = Arc::new(MockAuthority::with_tree(single_group(children)));
        let log = Arc::new(NotificationLog::new());
        let sync = RemoteSync::new(Arc::clone(&mock), log.clone());
        sync.reload().unwrap();
        (sync, mock, log)
    }

    fn add_under_group(id: &str) -> TreeEdit {
        TreeEdit::AddNode {
            node: member(id, 2.0),
            placement: Placement::Child {
                parent_id: "g".to_string(),
            },
        }
    }

    #[test]
    fn test_reload_marks_group_markers() {
        let (sync, _, _) = setup(vec![member("a", 1.0)]);
        let tree = sync.snapshot();
        assert!(tree.find("g").unwrap().is_top);
        assert!(!tree.find("a").unwrap().is_top);
        assert_eq!(sync.store().generation(), 1);
    }

    #[test]
    fn test_commit_applies_after_success() {
        let (sync, mock, log) = setup(vec![member("a", 1.0)]);
        mock.reply(200, "created");
        let tree = sync.commit(add_under_group("b")).unwrap();
        assert!(tree.contains("b"));
        assert!(sync.snapshot().is_same(&tree));
        assert_eq!(mock.calls().last().unwrap(), "add_node:b");
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Success);
        assert_eq!(entries[0].message, "created");
    }

    #[test]
    fn test_rejected_commit_leaves_snapshot() {
        let (sync, mock, log) = setup(vec![member("a", 1.0)]);
        let before = sync.snapshot();
        mock.reply(500, "db down");
        let err = sync.commit(add_under_group("b")).unwrap_err();
        assert!(matches!(err, NoteTreeError::Rejected { code: 500, .. }));
        assert!(sync.snapshot().is_same(&before));
        assert_eq!(log.count(Severity::Error), 1);
        assert_eq!(log.entries()[0].message, "db down");
    }

    #[test]
    fn test_transport_failure_uses_fallback() {
        let (sync, mock, log) = setup(vec![member("a", 1.0)]);
        let sync = sync.with_fallback_message("Could not reach the server");
        mock.fail_transport("connection refused");
        let err = sync.commit(add_under_group("b")).unwrap_err();
        assert!(matches!(err, NoteTreeError::Transport(_)));
        assert_eq!(log.entries()[0].message, "Could not reach the server");
        assert!(!sync.snapshot().contains("b"));
    }

    #[test]
    fn test_stale_anchor_publishes_nothing() {
        let (sync, mock, log) = setup(vec![member("a", 1.0)]);
        let store = Arc::clone(sync.store());
        mock.on_next_call(move || {
            let emptied = store.current().remove("g");
            store.replace(emptied);
        });
        let generation = sync.store().generation();
        let err = sync.commit(add_under_group("b")).unwrap_err();
        assert!(matches!(err, NoteTreeError::StaleSnapshot(ref id) if id == "g"));
        // only the concurrent replace was published
        assert_eq!(sync.store().generation(), generation + 1);
        assert_eq!(log.count(Severity::Error), 1);
    }

    #[test]
    fn test_commit_applies_to_current_snapshot() {
        let (sync, mock, _) = setup(vec![member("a", 1.0)]);
        let store = Arc::clone(sync.store());
        mock.on_next_call(move || {
            let renamed = store.current().rename("a", "Renamed elsewhere");
            store.replace(renamed);
        });
        let tree = sync.commit(add_under_group("b")).unwrap();
        assert_eq!(tree.find("a").unwrap().text, "Renamed elsewhere");
        assert!(tree.contains("b"));
    }

    #[test]
    fn test_failed_reload_keeps_snapshot() {
        let (sync, mock, log) = setup(vec![member("a", 1.0)]);
        let before = sync.snapshot();
        mock.reply(500, "");
        assert!(sync.reload().is_err());
        assert!(sync.snapshot().is_same(&before));
        assert_eq!(log.entries()[0].message, GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_from_config_uses_configured_fallback() {
        let mock = Arc::new(MockAuthority::with_tree(single_group(vec![member("a", 1.0)])));
        let log = Arc::new(NotificationLog::new());
        let config = ClientConfig {
            fallback_error_message: "Server unreachable".to_string(),
            ..ClientConfig::default()
        };
        let sync = RemoteSync::from_config(Arc::clone(&mock), log.clone(), &config);
        mock.fail_transport("connection reset");
        assert!(sync.reload().is_err());
        assert_eq!(log.entries()[0].message, "Server unreachable");
    }

    #[test]
    fn test_local_failure_is_reported_once() {
        let (sync, mock, log) = setup(vec![member("a", 1.0)]);
        let calls = mock.call_count();
        let e = NoteTreeError::NodeNotFound("zzz".to_string());
        assert!(e.is_local());
        sync.report_failure(&e);
        assert_eq!(mock.call_count(), calls);
        assert_eq!(log.count(Severity::Error), 1);
        assert_eq!(log.entries()[0].message, "Node no longer exists");
    }

    #[test]
    fn test_reload_keeps_expanded_markers() {
        let mut open = member("a", 1.0);
        open.collapsed = Some("false".to_string());
        let (sync, _, _) = setup(vec![open, member("b", 2.0)]);
        assert_eq!(sync.snapshot().expanded_ids(), vec!["a"]);
    }

    #[test]
    fn test_remove_group_sends_folder_flag() {
        let (sync, mock, _) = setup(vec![member("a", 1.0)]);
        let tree = sync
            .commit(TreeEdit::RemoveNode {
                id: "g".to_string(),
                is_folder: true,
            })
            .unwrap();
        assert!(tree.is_empty());
        assert_eq!(mock.calls().last().unwrap(), "remove_node:g:true");
    }
}
