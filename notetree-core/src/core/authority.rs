//! The remote authority: the server that owns the canonical tree.

use crate::{AddTreeNodeRequest, DataSourceItem, FolderRequest, NoteTreeError, Result, SidebarGroups};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The only envelope code that means success.
pub const SUCCESS_CODE: i64 = 200;

/// Response envelope wrapping every server answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    pub data: Option<T>,
    #[serde(default)]
    pub message: String,
}

/// An envelope whose payload is ignored.
pub type Ack = Envelope<serde_json::Value>;

impl<T> Envelope<T> {
    /// A success envelope.
    #[must_use]
    pub fn ok(data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            code: SUCCESS_CODE,
            data,
            message: message.into(),
        }
    }

    /// A failure envelope with no payload.
    #[must_use]
    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            data: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Turns a non-success envelope into [`NoteTreeError::Rejected`].
    pub fn accepted(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(NoteTreeError::Rejected {
                code: self.code,
                message: self.message,
            })
        }
    }

    /// The payload of a success envelope. A success without data is a parse error.
    pub fn into_data(self) -> Result<T> {
        self.accepted()?
            .data
            .ok_or_else(|| NoteTreeError::Parse("success envelope without data".to_string()))
    }
}

/// Remote collaborator for every tree and data-source operation.
///
/// `Err` means the call did not produce an envelope (transport or parse
/// failure). An `Ok` envelope may still carry a non-200 code; callers decide
/// success from `code` alone.
pub trait TreeAuthority: Send + Sync {
    /// Grouped tree for the sidebar.
    fn fetch_tree(&self) -> Result<Envelope<SidebarGroups>>;

    /// Notes not yet filed in the tree.
    fn fetch_data_source(&self) -> Result<Envelope<Vec<DataSourceItem>>>;

    fn add_node(&self, request: &AddTreeNodeRequest) -> Result<Ack>;

    fn add_folder(&self, request: &FolderRequest) -> Result<Ack>;

    /// Deletes a node, or a whole top-level group when `is_folder` is set.
    fn remove_node(&self, node_id: &str, is_folder: bool) -> Result<Ack>;

    fn remove_data_source_item(&self, item_id: &str) -> Result<Ack>;

    fn rename_node(&self, node_id: &str, name: &str) -> Result<Ack>;

    fn rename_folder(&self, request: &FolderRequest) -> Result<Ack>;
}

impl<A: TreeAuthority + ?Sized> TreeAuthority for Arc<A> {
    fn fetch_tree(&self) -> Result<Envelope<SidebarGroups>> {
        (**self).fetch_tree()
    }

    fn fetch_data_source(&self) -> Result<Envelope<Vec<DataSourceItem>>> {
        (**self).fetch_data_source()
    }

    fn add_node(&self, request: &AddTreeNodeRequest) -> Result<Ack> {
        (**self).add_node(request)
    }

    fn add_folder(&self, request: &FolderRequest) -> Result<Ack> {
        (**self).add_folder(request)
    }

    fn remove_node(&self, node_id: &str, is_folder: bool) -> Result<Ack> {
        (**self).remove_node(node_id, is_folder)
    }

    fn remove_data_source_item(&self, item_id: &str) -> Result<Ack> {
        (**self).remove_data_source_item(item_id)
    }

    fn rename_node(&self, node_id: &str, name: &str) -> Result<Ack> {
        (**self).rename_node(node_id, name)
    }

    fn rename_folder(&self, request: &FolderRequest) -> Result<Ack> {
        (**self).rename_folder(request)
    }
}
