//! Error types for database subscriptions.

use eventsource_stream::EventStreamError;
use thiserror::Error;

/// Errors that can occur while streaming values from the realtime database.
#[derive(Debug, Clone, Error)]
pub enum DatabaseError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse an event or payload.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout while opening the stream.
    #[error("Request timed out")]
    Timeout,

    /// The server cancelled the subscription (usually a rules violation).
    #[error("Subscription cancelled: {0}")]
    Cancelled(String),

    /// The auth token used by the stream is no longer valid.
    #[error("Authentication revoked")]
    AuthRevoked,

    /// The server closed the stream.
    #[error("Stream closed")]
    Closed,
}

impl From<reqwest::Error> for DatabaseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DatabaseError::Timeout
        } else if err.is_connect() {
            DatabaseError::Connection(err.to_string())
        } else {
            DatabaseError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Parse(err.to_string())
    }
}

impl From<EventStreamError<reqwest::Error>> for DatabaseError {
    fn from(err: EventStreamError<reqwest::Error>) -> Self {
        match err {
            EventStreamError::Transport(err) => err.into(),
            other => DatabaseError::Parse(other.to_string()),
        }
    }
}
