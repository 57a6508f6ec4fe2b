//! Identity pair domain model.

use serde::{Deserialize, Serialize};

/// The caller's identity pair, sent with every remote operation.
///
/// `user_id` survives client restarts (durable slot); `session_id` lives for
/// one session and is regenerated when a new session starts. Both are opaque,
/// non-empty, globally-unique tokens; once created for a storage scope they
/// are never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Durable user identifier (UUID format)
    pub user_id: String,
    /// Session-scoped identifier (UUID format)
    pub session_id: String,
}

impl Identity {
    /// Creates a new identity pair from the two tokens.
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}
