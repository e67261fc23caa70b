//! Error types for the map client.

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`Transport`](crate::Transport) or
/// [`Connector`](crate::Connector).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No cluster member answered at the address.
    #[error("cluster unreachable at '{address}': {message}")]
    Unreachable { address: String, message: String },

    /// The cluster refused the handshake credentials.
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// The remote end speaks a protocol this client does not understand.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    /// The connection broke while a request was outstanding.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The cluster answered but refused the request.
    #[error("request rejected by cluster: {0}")]
    Rejected(String),

    /// A response could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl TransportError {
    /// Whether the session that produced this error can no longer be used.
    pub fn breaks_session(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectionLost(_) | TransportError::Codec(_)
        )
    }
}

/// Errors surfaced by the connection manager and the session handles.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Startup connection failed; no cluster is reachable at all.
    #[error("failed to connect to '{address}' after {attempts} attempt(s): {source}")]
    Connection {
        address: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The operation referenced a session generation that has been replaced
    /// or torn down.
    #[error("session generation {generation} was invalidated")]
    SessionInvalidated { generation: u64 },

    /// Waiting for a live session exhausted the retry budget.
    #[error("cluster unavailable after {attempts} reconnect attempt(s){}", last_error_suffix(.last_error))]
    Unavailable {
        attempts: u32,
        last_error: Option<String>,
    },

    /// The caller or the connection manager was cancelled.
    #[error("operation cancelled")]
    Cancelled,

    /// The request did not complete within the configured timeout.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The request reached the transport and failed there.
    #[error("operation failed: {0}")]
    Operation(#[from] TransportError),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    match last_error {
        Some(e) => format!(" (last error: {e})"),
        None => String::new(),
    }
}

impl ClientError {
    /// True for errors that end a caller's loop rather than a single step.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClientError::Cancelled | ClientError::Unavailable { .. } | ClientError::Connection { .. }
        )
    }
}
