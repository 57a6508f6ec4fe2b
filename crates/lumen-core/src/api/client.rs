//! Remote client trait.

use async_trait::async_trait;

use super::model::{DeepDiveHandle, QueryReply, TurnReply};
use crate::error::Result;
use crate::identity::Identity;

/// An abstract client for the insight backend's four remote operations.
///
/// Each operation is a single round trip with no implicit retry; the caller
/// decides retry policy. Operations fail with `LumenError::Remote`; the
/// client never masks a failure with substitute data, so the life-cycle
/// layers above stay in control of what the user sees.
///
/// # Implementation Notes
///
/// Implementations should handle:
/// - Serializing the identity pair into every request
/// - Translating transport, status, and decode failures into `RemoteError`
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Submits an analytical query.
    ///
    /// # Arguments
    ///
    /// * `identity` - The caller's durable/session identity pair
    /// * `question` - The user's natural-language question
    ///
    /// # Errors
    ///
    /// Returns `LumenError::Remote` on any transport, status, or payload
    /// failure.
    async fn submit_query(&self, identity: &Identity, question: &str) -> Result<QueryReply>;

    /// Opens a deep-dive conversation seeded with the last question/answer
    /// pair, returning the conversation handle.
    async fn init_deep_dive(
        &self,
        identity: &Identity,
        last_question: &str,
        last_answer: &str,
    ) -> Result<DeepDiveHandle>;

    /// Sends one follow-up turn into an open deep-dive conversation.
    async fn send_turn(
        &self,
        identity: &Identity,
        question: &str,
        conversation_id: &str,
    ) -> Result<TurnReply>;

    /// Notifies the backend that a deep-dive conversation is over.
    ///
    /// Callers treat this as best-effort: local teardown must not block on
    /// the outcome. The client still reports failure faithfully.
    async fn end_deep_dive(&self, identity: &Identity, conversation_id: &str) -> Result<()>;
}
