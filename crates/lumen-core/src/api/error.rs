//! Remote failure taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure of a single remote round trip.
///
/// Every remote operation either returns its typed reply or fails with one of
/// these variants; the client layer never substitutes synthetic data. What to
/// do with a failure (surface it, swallow it, re-submit) is decided by the
/// calling life-cycle layer, keeping the resilience policy auditable.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    ///
    /// `message` carries the server-provided `message` field when the error
    /// body had one, otherwise a generic "Request failed with status N" text.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The server answered 2xx but the payload could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Builds the `Status` variant from a status code and an optional
    /// server-provided message.
    pub fn status(status: u16, message: Option<String>) -> Self {
        Self::Status {
            status,
            message: message
                .unwrap_or_else(|| format!("Request failed with status {}", status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_uses_server_message() {
        let err = RemoteError::status(422, Some("question must not be empty".to_string()));
        assert_eq!(err.to_string(), "question must not be empty");
    }

    #[test]
    fn test_status_falls_back_to_generic_message() {
        let err = RemoteError::status(500, None);
        assert_eq!(err.to_string(), "Request failed with status 500");
    }
}
