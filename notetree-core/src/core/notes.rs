//! Note content: listing, opening and saving the documents tree nodes point at.

use crate::{Ack, ClientConfig, Envelope, Notification, Notifier, NoteTreeError, Result, GENERIC_FAILURE_MESSAGE};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Envelope code the server uses for an unknown note.
pub const NOT_FOUND_CODE: i64 = 404;

/// A note as shown in lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub update_time: Option<NaiveDateTime>,
}

/// A note with its markdown body, as loaded into the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDetail {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub update_time: Option<NaiveDateTime>,
}

impl From<&NoteDetail> for NoteSummary {
    fn from(note: &NoteDetail) -> Self {
        Self {
            id: note.id.clone(),
            title: note.title.clone(),
            tags: note.tags.clone(),
            update_time: note.update_time,
        }
    }
}

/// Editor contents about to be saved. `id` is `None` for a note that was never saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

impl From<NoteDetail> for NoteDraft {
    fn from(note: NoteDetail) -> Self {
        Self {
            id: Some(note.id),
            title: note.title,
            content: note.content,
            tags: note.tags,
        }
    }
}

/// Remote collaborator for note content.
pub trait NoteAuthority: Send + Sync {
    fn list_notes(&self) -> Result<Envelope<Vec<NoteSummary>>>;

    fn get_note(&self, note_id: &str) -> Result<Envelope<NoteDetail>>;

    fn add_note(&self, draft: &NoteDraft) -> Result<Ack>;

    fn edit_note(&self, draft: &NoteDraft) -> Result<Ack>;
}

impl<A: NoteAuthority + ?Sized> NoteAuthority for Arc<A> {
    fn list_notes(&self) -> Result<Envelope<Vec<NoteSummary>>> {
        (**self).list_notes()
    }

    fn get_note(&self, note_id: &str) -> Result<Envelope<NoteDetail>> {
        (**self).get_note(note_id)
    }

    fn add_note(&self, draft: &NoteDraft) -> Result<Ack> {
        (**self).add_note(draft)
    }

    fn edit_note(&self, draft: &NoteDraft) -> Result<Ack> {
        (**self).edit_note(draft)
    }
}

/// Loads and saves note content, reporting outcomes through a [`Notifier`].
pub struct NoteStore<A> {
    authority: A,
    notifier: Arc<dyn Notifier>,
    fallback_message: String,
}

impl<A: NoteAuthority> NoteStore<A> {
    pub fn new(authority: A, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            authority,
            notifier,
            fallback_message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Creates a store that reports failures with the configured fallback message.
    pub fn from_config(authority: A, notifier: Arc<dyn Notifier>, config: &ClientConfig) -> Self {
        Self::new(authority, notifier).with_fallback_message(config.fallback_error_message.clone())
    }

    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Every note, in server order.
    pub fn list(&self) -> Result<Vec<NoteSummary>> {
        log::debug!("listing notes");
        self.authority
            .list_notes()
            .and_then(|e| e.into_data())
            .inspect_err(|e| self.report(e))
    }

    /// Fetches one note for the editor.
    pub fn open(&self, note_id: &str) -> Result<NoteDetail> {
        log::debug!("opening note {note_id}");
        let fetched = self.authority.get_note(note_id).and_then(|envelope| {
            if envelope.code == NOT_FOUND_CODE {
                return Err(NoteTreeError::NodeNotFound(note_id.to_string()));
            }
            envelope.into_data()
        });
        fetched.inspect_err(|e| self.report(e))
    }

    /// Saves the draft: edits an existing note, or adds a new one when `id` is `None`.
    ///
    /// Returns the server's message. A blank title fails before any call is made.
    pub fn save(&self, draft: &NoteDraft) -> Result<String> {
        if draft.title.trim().is_empty() {
            let e = NoteTreeError::Validation("A title is required".to_string());
            self.report(&e);
            return Err(e);
        }
        let sent = match draft.id {
            Some(ref id) => {
                log::debug!("saving note {id}");
                self.authority.edit_note(draft)
            }
            None => {
                log::debug!("adding note {:?}", draft.title);
                self.authority.add_note(draft)
            }
        };
        match sent.and_then(Ack::accepted) {
            Ok(ack) => {
                log::info!("note {:?} saved", draft.title);
                self.notifier.notify(Notification::success(ack.message.clone()));
                Ok(ack.message)
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    fn report(&self, error: &NoteTreeError) {
        log::warn!("note request failed: {error}");
        self.notifier
            .notify(Notification::error(error.user_message_or(&self.fallback_message)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::MockAuthority;
    use crate::{NotificationLog, Severity};

    fn detail(id: &str) -> NoteDetail {
        NoteDetail {
            id: id.to_string(),
            title: format!("Note {id}"),
            content: "# Heading".to_string(),
            tags: Some("draft".to_string()),
            update_time: None,
        }
    }

    fn setup() -> (NoteStore<Arc<MockAuthority>>, Arc<MockAuthority>, Arc<NotificationLog>) {
        let mock = Arc::new(MockAuthority::new().with_notes(vec![detail("a"), detail("b")]));
        let log = Arc::new(NotificationLog::new());
        (NoteStore::new(Arc::clone(&mock), log.clone()), mock, log)
    }

    #[test]
    fn test_list_returns_summaries() {
        let (store, _, _) = setup();
        let notes = store.list().unwrap();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[1].title, "Note b");
    }

    #[test]
    fn test_open_unknown_is_not_found() {
        let (store, _, log) = setup();
        assert_eq!(store.open("a").unwrap().content, "# Heading");
        let err = store.open("zzz").unwrap_err();
        assert!(matches!(err, NoteTreeError::NodeNotFound(_)));
        assert_eq!(log.count(Severity::Error), 1);
    }

    #[test]
    fn test_save_routes_by_id() {
        let (store, mock, log) = setup();
        let mut draft = NoteDraft::from(detail("a"));
        store.save(&draft).unwrap();
        assert_eq!(mock.calls().last().unwrap(), "edit_note:a");

        draft.id = None;
        draft.title = "Fresh".to_string();
        store.save(&draft).unwrap();
        assert_eq!(mock.calls().last().unwrap(), "add_note:Fresh");
        assert_eq!(log.count(Severity::Success), 2);
    }

    #[test]
    fn test_blank_title_makes_no_call() {
        let (store, mock, _) = setup();
        let draft = NoteDraft {
            title: " ".to_string(),
            ..NoteDraft::default()
        };
        assert!(matches!(store.save(&draft), Err(NoteTreeError::Validation(_))));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_rejected_save_reports_server_message() {
        let (store, mock, log) = setup();
        mock.reply(409, "title already used");
        let err = store.save(&NoteDraft::from(detail("a"))).unwrap_err();
        assert_eq!(err.user_message(), "title already used");
        assert_eq!(log.entries()[0].message, "title already used");
    }

    #[test]
    fn test_from_config_uses_configured_fallback() {
        let mock = Arc::new(MockAuthority::new().with_notes(vec![detail("a")]));
        let log = Arc::new(NotificationLog::new());
        let config = ClientConfig {
            fallback_error_message: "Notes are unavailable".to_string(),
            ..ClientConfig::default()
        };
        let store = NoteStore::from_config(Arc::clone(&mock), log.clone(), &config);
        mock.fail_transport("timed out");
        assert!(store.list().is_err());
        assert_eq!(log.entries()[0].message, "Notes are unavailable");
    }

    #[test]
    fn test_draft_omits_missing_id() {
        let draft = NoteDraft {
            title: "T".to_string(),
            content: "body".to_string(),
            ..NoteDraft::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("id").is_none());
    }
}
