//! User-facing notifications raised by remote edits.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Outcome class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// One message for the snackbar area of the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// Unix timestamp (seconds) when the notification was raised.
    pub at: i64,
}

impl Notification {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Receives notifications. Implementations must be cheap; they run on the edit path.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Keeps every notification in memory, oldest first.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything raised so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Removes and returns everything raised so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of notifications of `severity`.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.entries().iter().filter(|n| n.severity == severity).count()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

/// Forwards notifications to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Success => log::info!("{}", notification.message),
            Severity::Error => log::error!("{}", notification.message),
        }
    }
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification);
    }
}
