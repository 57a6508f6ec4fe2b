//! Process-wide session state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::identity::Identity;

#[derive(Debug, Clone, Default)]
struct ContextState {
    /// Active deep-dive conversation id; `None` means no deep dive is open.
    conversation_id: Option<String>,
    /// Last successful (question, answer) pair, used to seed a deep dive.
    last_qa: Option<(String, String)>,
}

/// Process-wide shared session state.
///
/// Holds the identity pair, the active deep-dive conversation id, and the
/// last question/answer pair. Constructed explicitly at startup and passed by
/// `Arc` to its consumers rather than living as ambient global state.
///
/// Single-writer discipline: only the life-cycle layers (query orchestrator,
/// conversation manager) call the mutating methods; presentation code reads.
#[derive(Debug)]
pub struct SessionContext {
    identity: Identity,
    state: Arc<RwLock<ContextState>>,
}

impl SessionContext {
    /// Creates a new context for the given identity with no active
    /// conversation and no recorded question/answer pair.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            state: Arc::new(RwLock::new(ContextState::default())),
        }
    }

    /// Returns the identity pair. Fixed for the lifetime of the context.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the active deep-dive conversation id, if any.
    pub async fn conversation_id(&self) -> Option<String> {
        self.state.read().await.conversation_id.clone()
    }

    /// Records the conversation id of a freshly opened deep dive.
    pub async fn set_conversation_id(&self, conversation_id: String) {
        self.state.write().await.conversation_id = Some(conversation_id);
    }

    /// Clears the active conversation id.
    pub async fn clear_conversation(&self) {
        self.state.write().await.conversation_id = None;
    }

    /// Returns the last successful (question, answer) pair, if any.
    pub async fn last_qa(&self) -> Option<(String, String)> {
        self.state.read().await.last_qa.clone()
    }

    /// Records the question/answer pair of the latest successful query.
    pub async fn set_last_qa(&self, question: String, answer: String) {
        self.state.write().await.last_qa = Some((question, answer));
    }
}
