//! Scriptable in-memory authority for unit tests.

use crate::{
    Ack, AddTreeNodeRequest, DataSourceItem, Envelope, FolderRequest, NoteAuthority, NoteDetail, NoteDraft,
    NoteSummary, NoteTreeError, Result, SidebarGroups, TreeAuthority, TreeNode,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted answer for the next call.
pub(crate) enum Reply {
    Code(i64, String),
    Transport(String),
}

type Hook = Box<dyn FnOnce() + Send>;

/// Records every call and answers from a queue of scripted replies.
///
/// With an empty queue every call succeeds with the message `"ok"`.
#[derive(Default)]
pub(crate) struct MockAuthority {
    calls: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<Reply>>,
    before_reply: Mutex<Option<Hook>>,
    tree: Mutex<SidebarGroups>,
    data_source: Mutex<Vec<DataSourceItem>>,
    notes: Mutex<Vec<NoteDetail>>,
}

impl MockAuthority {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_tree(groups: SidebarGroups) -> Self {
        let mock = Self::new();
        *mock.tree.lock().unwrap() = groups;
        mock
    }

    pub(crate) fn with_data_source(self, items: Vec<DataSourceItem>) -> Self {
        *self.data_source.lock().unwrap() = items;
        self
    }

    pub(crate) fn with_notes(self, notes: Vec<NoteDetail>) -> Self {
        *self.notes.lock().unwrap() = notes;
        self
    }

    /// Queues an envelope with `code` and `message` for the next call.
    pub(crate) fn reply(&self, code: i64, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Code(code, message.to_string()));
    }

    /// Queues a transport failure for the next call.
    pub(crate) fn fail_transport(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Transport(message.to_string()));
    }

    /// Runs `f` while the next call is in flight, before it answers.
    pub(crate) fn on_next_call(&self, f: impl FnOnce() + Send + 'static) {
        *self.before_reply.lock().unwrap() = Some(Box::new(f));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn answer<T>(&self, call: String, data: impl FnOnce() -> Option<T>) -> Result<Envelope<T>> {
        self.calls.lock().unwrap().push(call);
        let hook = self.before_reply.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            None => Ok(Envelope::ok(data(), "ok")),
            Some(Reply::Code(200, message)) => Ok(Envelope::ok(data(), message)),
            Some(Reply::Code(code, message)) => Ok(Envelope::failure(code, message)),
            Some(Reply::Transport(message)) => Err(NoteTreeError::Transport(message)),
        }
    }

    fn ack(&self, call: String) -> Result<Ack> {
        self.answer(call, || None)
    }
}

/// Builds a one-group sidebar: marker `g` (link label `docs`) holding `children`.
pub(crate) fn single_group(children: Vec<TreeNode>) -> SidebarGroups {
    let marker = TreeNode {
        id: "g".to_string(),
        text: "Docs".to_string(),
        items: Some(children.into_iter().map(std::sync::Arc::new).collect()),
        link_txt: Some("docs".to_string()),
        folder_id: Some("g".to_string()),
        sort: 1.0,
        ..TreeNode::default()
    };
    SidebarGroups(vec![("/docs/".to_string(), vec![marker])])
}

/// A node filed directly under group `g`.
pub(crate) fn member(id: &str, sort: f64) -> TreeNode {
    TreeNode {
        id: id.to_string(),
        text: id.to_uppercase(),
        items: Some(Vec::new()),
        link_txt: Some("docs".to_string()),
        folder_id: Some("g".to_string()),
        sort,
        ..TreeNode::default()
    }
}

impl TreeAuthority for MockAuthority {
    fn fetch_tree(&self) -> Result<Envelope<SidebarGroups>> {
        let tree = self.tree.lock().unwrap().clone();
        self.answer("fetch_tree".to_string(), || Some(tree))
    }

    fn fetch_data_source(&self) -> Result<Envelope<Vec<DataSourceItem>>> {
        let items = self.data_source.lock().unwrap().clone();
        self.answer("fetch_data_source".to_string(), || Some(items))
    }

    fn add_node(&self, request: &AddTreeNodeRequest) -> Result<Ack> {
        self.ack(format!("add_node:{}", request.id))
    }

    fn add_folder(&self, request: &FolderRequest) -> Result<Ack> {
        self.ack(format!("add_folder:{}", request.id))
    }

    fn remove_node(&self, node_id: &str, is_folder: bool) -> Result<Ack> {
        self.ack(format!("remove_node:{node_id}:{is_folder}"))
    }

    fn remove_data_source_item(&self, item_id: &str) -> Result<Ack> {
        self.ack(format!("remove_data_source_item:{item_id}"))
    }

    fn rename_node(&self, node_id: &str, name: &str) -> Result<Ack> {
        self.ack(format!("rename_node:{node_id}:{name}"))
    }

    fn rename_folder(&self, request: &FolderRequest) -> Result<Ack> {
        self.ack(format!("rename_folder:{}", request.id))
    }
}

impl NoteAuthority for MockAuthority {
    fn list_notes(&self) -> Result<Envelope<Vec<NoteSummary>>> {
        let summaries = self.notes.lock().unwrap().iter().map(NoteSummary::from).collect();
        self.answer("list_notes".to_string(), || Some(summaries))
    }

    fn get_note(&self, note_id: &str) -> Result<Envelope<NoteDetail>> {
        let found = self.notes.lock().unwrap().iter().find(|n| n.id == note_id).cloned();
        if found.is_none() {
            self.calls.lock().unwrap().push(format!("get_note:{note_id}"));
            return Ok(Envelope::failure(404, "note not found"));
        }
        self.answer(format!("get_note:{note_id}"), || found)
    }

    fn add_note(&self, draft: &NoteDraft) -> Result<Ack> {
        self.ack(format!("add_note:{}", draft.title))
    }

    fn edit_note(&self, draft: &NoteDraft) -> Result<Ack> {
        self.ack(format!("edit_note:{}", draft.id.as_deref().unwrap_or_default()))
    }
}
