//! Remote backend interface.
//!
//! This module defines the contract for the four remote operations of the
//! insight backend, the typed replies they produce, and the failure taxonomy
//! for remote calls. The concrete HTTP implementation lives in
//! `lumen-interaction`; orchestration code depends only on the trait so it can
//! be exercised against in-memory doubles.

mod client;
mod error;
mod model;

// Re-export public API
pub use client::ApiClient;
pub use error::RemoteError;
pub use model::{ConversationTurn, DeepDiveHandle, QueryReply, TurnReply};
