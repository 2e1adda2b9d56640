//! Error types for the course player.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while loading or driving the course player.
#[derive(Debug, Error, Clone)]
pub enum PlayerError {
    /// Network/HTTP request failed before a response arrived
    #[error("Network error: {message}")]
    Network { message: String },

    /// The bearer credential was rejected (expired or invalid)
    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    /// No credential is available to authenticate the request
    #[error("No credential available, sign in required")]
    MissingCredential,

    /// The enrollment or course does not belong to this learner
    #[error("Access denied: {message}")]
    Forbidden { message: String },

    /// Course, curriculum, or enrollment does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Backend answered with a non-success status
    #[error("Backend returned status {status}: {message}")]
    Http { status: u16, message: String },

    /// Backend answered successfully but with an unusable payload
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Response body could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Navigation target outside the playback sequence
    #[error("Lesson index {index} out of range (sequence has {len} lessons)")]
    OutOfRange { index: usize, len: usize },

    /// No curriculum/enrollment has been loaded yet
    #[error("Course player has not been loaded")]
    NotLoaded,

    /// The loaded curriculum has no lessons
    #[error("Course has no lessons")]
    EmptyCurriculum,

    /// A completion request is already pending
    #[error("A completion request is already in progress")]
    CompletionInFlight,

    /// Configuration could not be built
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// What the UI should offer the learner after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Send the learner through sign-in again
    Reauthenticate,
    /// Let the learner retry the same action
    Retry,
    /// Leave the player for the course list
    ReturnToLibrary,
    /// Caller bug or transient UI state; nothing to offer
    None,
}

impl PlayerError {
    /// Returns true if this error indicates the credential needs to be refreshed.
    pub fn needs_reauth(&self) -> bool {
        matches!(
            self,
            PlayerError::SessionExpired { .. } | PlayerError::MissingCredential
        )
    }

    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlayerError::Network { .. } | PlayerError::UnexpectedResponse { .. } => true,
            PlayerError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn recovery(&self) -> Recovery {
        if self.needs_reauth() {
            return Recovery::Reauthenticate;
        }
        if self.is_retryable() {
            return Recovery::Retry;
        }
        match self {
            PlayerError::Forbidden { .. }
            | PlayerError::NotFound { .. }
            | PlayerError::Decode { .. }
            | PlayerError::Http { .. } => Recovery::ReturnToLibrary,
            _ => Recovery::None,
        }
    }

    /// Message shown to the learner.
    pub fn user_message(&self) -> &'static str {
        match self {
            PlayerError::SessionExpired { .. } | PlayerError::MissingCredential => {
                "Session expired. Please login again."
            }
            PlayerError::Forbidden { .. } => "You do not have access to this course.",
            PlayerError::NotFound { .. } => "This course could not be found.",
            PlayerError::CompletionInFlight => "Saving your progress...",
            PlayerError::EmptyCurriculum => "This course has no lessons yet.",
            PlayerError::OutOfRange { .. } | PlayerError::NotLoaded => {
                "Something went wrong. Please reload the course."
            }
            PlayerError::Config { .. } => "The player is misconfigured.",
            _ => "Request failed. Please try again.",
        }
    }

    /// Maps a non-success HTTP status to an error.
    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => PlayerError::SessionExpired { message },
            StatusCode::FORBIDDEN => PlayerError::Forbidden { message },
            StatusCode::NOT_FOUND => PlayerError::NotFound { message },
            status => PlayerError::Http {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for PlayerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return PlayerError::Decode {
                message: err.to_string(),
            };
        }
        PlayerError::Network {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PlayerError {
    fn from(err: serde_json::Error) -> Self {
        PlayerError::Decode {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for PlayerError {
    fn from(err: url::ParseError) -> Self {
        PlayerError::Config {
            message: format!("invalid backend URL: {err}"),
        }
    }
}
