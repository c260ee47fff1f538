//! Error types for the notetree core library.

use thiserror::Error;

/// Message shown when a failure carries no server-provided text.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// All errors that can occur within the notetree core library.
#[derive(Debug, Error)]
pub enum NoteTreeError {
    /// The request never reached the server, or the connection failed mid-flight.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered, but the body could not be understood.
    #[error("Malformed response: {0}")]
    Parse(String),

    /// The server answered with an envelope whose `code` is not 200.
    #[error("Rejected by server ({code}): {message}")]
    Rejected {
        /// Envelope code returned by the server.
        code: i64,
        /// Server-provided message; may be empty.
        message: String,
    },

    /// A required field was empty; no remote call was attempted.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A node ID was referenced that does not exist in the current snapshot.
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The server accepted an edit whose anchor node has since left the snapshot.
    #[error("Snapshot changed while the edit was in flight: {0}")]
    StaleSnapshot(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Data could not be (de)serialized as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for NoteTreeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Convenience alias that pins the error type to [`NoteTreeError`].
pub type Result<T> = std::result::Result<T, NoteTreeError>;

impl NoteTreeError {
    /// Returns a short, human-readable message suitable for display to the end user.
    ///
    /// A server-provided message always wins; otherwise transport and parse
    /// failures collapse to [`GENERIC_FAILURE_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        self.user_message_or(GENERIC_FAILURE_MESSAGE)
    }

    /// Like [`Self::user_message`], with a caller-chosen fallback string.
    #[must_use]
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::Rejected { .. } | Self::Transport(_) | Self::Parse(_) => fallback.to_string(),
            Self::Validation(msg) => msg.clone(),
            Self::NodeNotFound(_) => "Node no longer exists".to_string(),
            Self::StaleSnapshot(_) => "The tree changed before the edit could be shown; reload to see it".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }

    /// Returns `true` for failures that happened before any request was sent.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NodeNotFound(_))
    }
}
