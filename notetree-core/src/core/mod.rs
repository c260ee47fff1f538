//! Internal domain modules for the notetree core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod authority;
pub mod config;
pub mod controller;
pub mod data_source;
pub mod drop_zone;
pub mod edit;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod node;
pub mod notes;
pub mod notify;
pub mod sort_key;
pub mod sorting;
pub mod sync;
pub mod tree;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

#[doc(inline)]
pub use authority::{Ack, Envelope, TreeAuthority, SUCCESS_CODE};
#[doc(inline)]
pub use config::{
    config_file_path, load_config, load_config_from, save_config, save_config_to, ClientConfig, API_URL_ENV,
};
#[doc(inline)]
pub use controller::{DialogMode, EditPhase, NodeInput, TreeController};
#[doc(inline)]
pub use data_source::{DataSource, DataSourceItem};
#[doc(inline)]
pub use drop_zone::{resolve_drop, DropIntent, DropPosition, DropTracker, Point, Rect, DEAD_ZONE_PX};
#[doc(inline)]
pub use edit::{Placement, TreeEdit};
#[doc(inline)]
pub use error::{NoteTreeError, Result, GENERIC_FAILURE_MESSAGE};
#[cfg(feature = "http")]
#[doc(inline)]
pub use http::HttpAuthority;
#[doc(inline)]
pub use node::{note_link, TreeNode};
#[doc(inline)]
pub use notes::{NoteAuthority, NoteDetail, NoteDraft, NoteStore, NoteSummary, NOT_FOUND_CODE};
#[doc(inline)]
pub use notify::{LogNotifier, Notification, NotificationLog, Notifier, Severity};
#[doc(inline)]
pub use sort_key::{child_sort, is_exhausted, sort_after, sort_before, CHILD_EPSILON, SIBLING_EPSILON};
#[doc(inline)]
pub use sorting::SortingWorkspace;
#[doc(inline)]
pub use sync::{RemoteSync, SnapshotStore};
#[doc(inline)]
pub use tree::{RemoveResult, Tree};
#[doc(inline)]
pub use wire::{groups_from_rows, rows_from_tree, AddTreeNodeRequest, FolderRequest, SidebarGroups};
