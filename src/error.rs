//! Error types for storage collaborators.

use thiserror::Error;

/// Errors surfaced by the session and task stores.
///
/// Analytics never propagates these to API clients; the summary assembler
/// degrades to an empty summary and the error is only logged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend could not be reached or failed at the
    /// transport level.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable {
            message: e.to_string(),
        }
    }
}
