//! Session history error types.

use thiserror::Error;

/// Errors that can occur while reading or writing session history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history file could not be read or written.
    #[error("history file I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The history file exists but is not valid JSON.
    #[error("history file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing records failed.
    #[error("failed to serialize session history: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl HistoryError {
    /// Returns true if the stored data itself is unreadable.
    #[must_use]
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}
