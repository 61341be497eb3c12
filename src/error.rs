//! Error types for the time-tracking core and the tracker client.

use std::path::PathBuf;

/// All errors that can occur in jiratime operations.
///
/// Each variant belongs to one failure kind: the remote tracker is
/// unreachable, it answered with something we could not decode, it rejected
/// the request, the user supplied unusable input, or local storage failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Collaborator unavailable
    #[error("Tracker request failed: {0}")]
    Unavailable(String),

    // Malformed response
    #[error("Malformed response from tracker: {0}")]
    MalformedResponse(String),

    // Remote rejection
    #[error("{0}")]
    Rejected(String),

    // Invalid input
    #[error("Invalid duration format: '{0}'")]
    InvalidDuration(String),

    #[error("No duration available. Run the timer or enter a duration")]
    NoDuration,

    #[error("Timer not started")]
    NotStarted,

    #[error("Timer already running for {0}")]
    AlreadyRunning(String),

    #[error("Timer is running for {0}. Stop it before logging")]
    TimerRunning(String),

    #[error("No issue selected")]
    NoIssueSelected,

    // Local storage
    #[error("Work log storage failed: {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Work log serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Session database error: {0}")]
    Database(#[from] rusqlite::Error),

    // Configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the tracker itself answered and refused the request.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }

    /// True for failures caused by what the user typed or the order of
    /// their actions, which can be fixed without touching the network.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidDuration(_)
                | Error::NoDuration
                | Error::NotStarted
                | Error::AlreadyRunning(_)
                | Error::TimerRunning(_)
                | Error::NoIssueSelected
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::MalformedResponse(err.to_string())
        } else {
            Error::Unavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
