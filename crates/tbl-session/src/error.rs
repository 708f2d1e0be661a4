//! Error types for tbl-session

use thiserror::Error;

/// Result type alias using tbl-session Error
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failures while resolving an exercise prompt
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No prompt file exists for the exercise
    #[error("Exercise not found: {0}")]
    NotFound(String),

    /// The prompt file exists but could not be read
    #[error("Failed to read exercise {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by the session controller. None of them end the session.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The completion service call failed; the user may resubmit
    #[error("Failed to generate response: {0}")]
    CompletionFailed(#[source] tbl_ai::Error),

    /// Exercise prompt could not be loaded
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Messages cannot be sent before an exercise prompt is loaded
    #[error("No exercise selected")]
    NoExerciseSelected,

    /// The user must answer the save-before-switching question first
    #[error("An exercise change is waiting for confirmation")]
    ConfirmationPending,

    /// Confirm/cancel was requested with no exercise change pending
    #[error("No exercise change is pending")]
    NoPendingChange,

    /// Save was requested on an empty transcript
    #[error("No conversation to save yet")]
    NothingToSave,

    /// Submitted text was blank
    #[error("Message is empty")]
    EmptyMessage,

    /// Model is not one of the configured choices
    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

impl SessionError {
    /// Check if this error came from the completion service
    pub fn is_completion_failure(&self) -> bool {
        matches!(self, SessionError::CompletionFailed(_))
    }
}
