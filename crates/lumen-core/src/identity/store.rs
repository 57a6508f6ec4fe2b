//! Identity store trait.

use async_trait::async_trait;

use super::model::Identity;
use crate::error::Result;

/// An abstract store for the durable and session identity slots.
///
/// This trait decouples identity retrieval from the storage mechanism
/// (e.g., files under the data directory, an in-memory double in tests).
///
/// # Contract
///
/// - `get_or_create_user_id` reads the durable slot; if absent it generates a
///   new unique token, persists it, and returns it. Every later call in the
///   same storage scope returns the same value until the scope is externally
///   cleared.
/// - `get_or_create_session_id` has identical logic against a session-scoped
///   slot that goes away when the session ends.
/// - Storage unavailability is a fatal startup condition for the client; it
///   is propagated, not handled locally.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Returns the durable user identifier, creating it on first use.
    async fn get_or_create_user_id(&self) -> Result<String>;

    /// Returns the session identifier, creating it on first use.
    async fn get_or_create_session_id(&self) -> Result<String>;

    /// Resolves the full identity pair.
    async fn identity(&self) -> Result<Identity> {
        let user_id = self.get_or_create_user_id().await?;
        let session_id = self.get_or_create_session_id().await?;
        Ok(Identity::new(user_id, session_id))
    }
}
