//! The panel of notes that are not yet filed anywhere in the tree.

use crate::{ClientConfig, Notification, Notifier, NoteTreeError, Result, TreeAuthority, TreeNode, GENERIC_FAILURE_MESSAGE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// One unfiled note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceItem {
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub update_time: Option<NaiveDateTime>,
}

impl DataSourceItem {
    /// The panel entry a tree node turns back into when it is dragged out of the tree.
    ///
    /// Only nodes that point at a note have one; plain folders return `None`.
    #[must_use]
    pub fn from_node(node: &TreeNode) -> Option<Self> {
        Some(Self {
            id: node.note_id.clone()?,
            text: node.text.clone(),
            tags: None,
            update_time: None,
        })
    }
}

/// Client-side list of unfiled notes, kept in server order.
pub struct DataSource<A> {
    authority: A,
    notifier: Arc<dyn Notifier>,
    fallback_message: String,
    items: RwLock<Vec<DataSourceItem>>,
}

impl<A: TreeAuthority> DataSource<A> {
    pub fn new(authority: A, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            authority,
            notifier,
            fallback_message: GENERIC_FAILURE_MESSAGE.to_string(),
            items: RwLock::new(Vec::new()),
        }
    }

    /// Creates a panel that reports failures with the configured fallback message.
    pub fn from_config(authority: A, notifier: Arc<dyn Notifier>, config: &ClientConfig) -> Self {
        Self::new(authority, notifier).with_fallback_message(config.fallback_error_message.clone())
    }

    /// Sets the message shown when a failure carries no server text.
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Fetches the list from the server and replaces the local copy.
    pub fn load(&self) -> Result<Vec<DataSourceItem>> {
        log::debug!("fetching data source");
        match self.authority.fetch_data_source().and_then(|e| e.into_data()) {
            Ok(items) => {
                log::info!("loaded {} unfiled notes", items.len());
                *self.items.write().unwrap_or_else(PoisonError::into_inner) = items.clone();
                Ok(items)
            }
            Err(e) => {
                log::warn!("data source fetch failed: {e}");
                self.report(&e);
                Err(e)
            }
        }
    }

    /// The local list.
    #[must_use]
    pub fn items(&self) -> Vec<DataSourceItem> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn get(&self, item_id: &str) -> Option<DataSourceItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
    }

    /// Deletes an item on the server, then locally once the server confirms.
    pub fn remove(&self, item_id: &str) -> Result<()> {
        log::debug!("removing data source item {item_id}");
        let ack = self
            .authority
            .remove_data_source_item(item_id)
            .and_then(|ack| ack.accepted());
        match ack {
            Ok(ack) => {
                self.take(item_id);
                self.notifier.notify(Notification::success(ack.message));
                Ok(())
            }
            Err(e) => {
                log::warn!("removing data source item {item_id} failed: {e}");
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Removes an item from the local list only.
    pub fn take(&self, item_id: &str) -> Option<DataSourceItem> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let index = items.iter().position(|i| i.id == item_id)?;
        Some(items.remove(index))
    }

    /// Appends an item to the local list only.
    pub fn push(&self, item: DataSourceItem) {
        self.items.write().unwrap_or_else(PoisonError::into_inner).push(item);
    }

    fn report(&self, error: &NoteTreeError) {
        self.notifier
            .notify(Notification::error(error.user_message_or(&self.fallback_message)));
    }
}
