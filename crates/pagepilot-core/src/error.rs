//! Error types for pagepilot-core

use thiserror::Error;
use uuid::Uuid;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A session id was supplied but no live connection is bound to it
    #[error("no live connection for session: {0}")]
    SessionNotFound(String),

    /// The registry holds no live connection at all
    #[error("no browser client connected")]
    NoClients,

    /// Command sent but no reply arrived within the budget
    #[error("timeout after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds elapsed before giving up
        elapsed_ms: u64,
    },

    /// The connection went away while a command was in flight
    #[error("connection closed: {0}")]
    ConnectionClosed(Uuid),

    /// The browser answered with an error frame
    #[error("remote error: {0}")]
    Remote(String),

    /// The browser answered with a payload that does not match the command
    #[error("malformed reply to {method}: {message}")]
    MalformedReply {
        /// Command method the reply belongs to
        method: &'static str,
        /// Decoder message
        message: String,
    },

    /// Frame (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for the two "nothing to talk to" lookups
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound(_) | Self::NoClients)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
