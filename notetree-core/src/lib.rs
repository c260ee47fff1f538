//! Core library for notetree, a client for a server-backed hierarchical note tree.
//!
//! The tree lives on the server. The client holds immutable [`Tree`]
//! snapshots and changes them only after the server confirms an edit:
//! [`TreeController`] turns gestures into [`TreeEdit`]s, [`RemoteSync`]
//! sends them through a [`TreeAuthority`] and publishes the result.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    authority::{Ack, Envelope, TreeAuthority, SUCCESS_CODE},
    config::{
        config_file_path, load_config, load_config_from, save_config, save_config_to, ClientConfig, API_URL_ENV,
    },
    controller::{DialogMode, EditPhase, NodeInput, TreeController},
    data_source::{DataSource, DataSourceItem},
    drop_zone::{resolve_drop, DropIntent, DropPosition, DropTracker, Point, Rect, DEAD_ZONE_PX},
    edit::{Placement, TreeEdit},
    error::{NoteTreeError, Result, GENERIC_FAILURE_MESSAGE},
    node::{note_link, TreeNode},
    notes::{NoteAuthority, NoteDetail, NoteDraft, NoteStore, NoteSummary, NOT_FOUND_CODE},
    notify::{LogNotifier, Notification, NotificationLog, Notifier, Severity},
    sort_key::{child_sort, is_exhausted, sort_after, sort_before, CHILD_EPSILON, SIBLING_EPSILON},
    sorting::SortingWorkspace,
    sync::{RemoteSync, SnapshotStore},
    tree::{RemoveResult, Tree},
    wire::{groups_from_rows, rows_from_tree, AddTreeNodeRequest, FolderRequest, SidebarGroups},
};

#[cfg(feature = "http")]
#[doc(inline)]
pub use core::http::HttpAuthority;
