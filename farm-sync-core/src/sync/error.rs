//! Sync error types.

use thiserror::Error;

use crate::lifecycle::LifecycleError;

/// A failed call to the farm server.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The request never produced a response (offline, DNS, timeout).
    #[error("Network unavailable: {status_text}")]
    Network { status_text: String },
    /// The server answered with a non-success status.
    #[error("Server returned {status}: {status_text}")]
    Status { status: u16, status_text: String },
    /// The server answered but the body could not be understood.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn network(status_text: impl Into<String>) -> Self {
        TransportError::Network {
            status_text: status_text.into(),
        }
    }

    pub fn status(status: u16, status_text: impl Into<String>) -> Self {
        TransportError::Status {
            status,
            status_text: status_text.into(),
        }
    }

    /// HTTP status, absent for network failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn status_text(&self) -> &str {
        match self {
            TransportError::Network { status_text } | TransportError::Status { status_text, .. } => {
                status_text
            }
            TransportError::Decode(message) => message,
        }
    }
}

/// Errors that end a sync operation.
#[derive(Error, Debug)]
pub enum SyncError {
    /// No token available; the user has been sent to log in.
    #[error("Not logged in. Add a host and token to the config, then sync again.")]
    MissingCredential,
    /// A transport failure the classifier does not recover from.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A local commit targeted a log that no longer exists.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    /// A push task panicked or was aborted.
    #[error("Push task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessors() {
        let err = TransportError::status(403, "Forbidden");
        assert_eq!(err.status_code(), Some(403));
        assert_eq!(err.status_text(), "Forbidden");
        assert_eq!(err.to_string(), "Server returned 403: Forbidden");

        let err = TransportError::network("connection refused");
        assert_eq!(err.status_code(), None);
        assert_eq!(err.status_text(), "connection refused");
    }

    #[test]
    fn test_sync_error_wraps_transport() {
        let err: SyncError = TransportError::Decode("expected list".to_string()).into();
        assert!(matches!(err, SyncError::Transport(TransportError::Decode(_))));
        assert_eq!(err.to_string(), "Unexpected response: expected list");
    }
}
