//! Deep-dive conversation life cycle.
//!
//! Drives a follow-up conversation through `Closed → Initializing → Open →
//! Closed`. Turns are appended optimistically before the remote reply and
//! reconciled when it arrives; teardown always succeeds locally regardless of
//! the remote acknowledgement.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use lumen_core::api::ApiClient;
use lumen_core::error::{LumenError, Result};
use lumen_core::session::{ChatMessage, SessionContext};

/// Phase of the deep-dive life cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChatPhase {
    #[default]
    Closed,
    Initializing,
    Open,
}

/// Phase of a single turn's reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// User message appended, remote reply outstanding.
    Pending,
    /// Remote reply arrived and the assistant message was appended.
    Confirmed,
    /// Remote call failed; the user message stays without a reply.
    Failed,
}

/// Reconciliation state of the latest turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    /// Id of the optimistically appended user message.
    pub message_id: String,
    pub phase: TurnPhase,
}

/// Result of a turn submission that did not fail remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn ran its full round trip.
    Completed,
    /// The turn was not accepted (conversation not open, or another turn
    /// still pending). Nothing changed.
    Rejected,
}

/// Observable state of the conversation, published on every change.
#[derive(Debug, Clone, Default)]
pub struct ChatSnapshot {
    pub phase: ChatPhase,
    /// Append-only message sequence of the open conversation.
    pub messages: Vec<ChatMessage>,
    /// Reconciliation state of the latest turn, if any was submitted.
    pub turn: Option<TurnState>,
}

/// Drives the deep-dive conversation life cycle.
///
/// At most one turn is in flight at a time; a turn submitted while another is
/// pending is rejected rather than interleaved.
pub struct ConversationManager {
    client: Arc<dyn ApiClient>,
    context: Arc<SessionContext>,
    state: Arc<RwLock<ChatSnapshot>>,
    updates: watch::Sender<ChatSnapshot>,
}

impl ConversationManager {
    pub fn new(client: Arc<dyn ApiClient>, context: Arc<SessionContext>) -> Self {
        let (updates, _) = watch::channel(ChatSnapshot::default());
        Self {
            client,
            context,
            state: Arc::new(RwLock::new(ChatSnapshot::default())),
            updates,
        }
    }

    /// Opens a deep dive against the last successful query.
    ///
    /// The first two messages (the original question and the original
    /// insight) are seeded locally before the remote call, so the
    /// conversation is never empty while init is in flight. Calling this
    /// while a conversation is already initializing or open is a no-op.
    ///
    /// # Errors
    ///
    /// - `Precondition` when no query has succeeded yet; no remote call is
    ///   made and no state changes.
    /// - `Remote` when init fails; the machine returns to `Closed` with no
    ///   conversation id.
    pub async fn open(&self) -> Result<()> {
        let Some((question, answer)) = self.context.last_qa().await else {
            return Err(LumenError::precondition(
                "deep dive requires a completed query",
            ));
        };

        {
            let mut state = self.state.write().await;
            if state.phase != ChatPhase::Closed {
                return Ok(());
            }
            state.phase = ChatPhase::Initializing;
            state.messages = vec![
                ChatMessage::user("1", question.clone()),
                ChatMessage::assistant("2", answer.clone()),
            ];
            state.turn = None;
            self.updates.send_replace(state.clone());
        }

        match self
            .client
            .init_deep_dive(self.context.identity(), &question, &answer)
            .await
        {
            Ok(handle) => {
                self.context
                    .set_conversation_id(handle.conversation_id.clone())
                    .await;
                let mut state = self.state.write().await;
                state.phase = ChatPhase::Open;
                self.updates.send_replace(state.clone());
                tracing::info!(conversation_id = %handle.conversation_id, "deep dive opened");
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.phase = ChatPhase::Closed;
                state.messages.clear();
                self.updates.send_replace(state.clone());
                tracing::warn!(error = %e, "deep dive init failed");
                Err(e)
            }
        }
    }

    /// Submits one follow-up turn.
    ///
    /// The user message is appended immediately (optimistic), then the remote
    /// call runs. On success the assistant's answer is appended; on failure
    /// the user message stays without a reply and the error is returned for
    /// display. There is no automatic retry; a later call submits a fresh turn.
    ///
    /// Returns `Ok(TurnOutcome::Rejected)` without side effects when the
    /// conversation is not open or another turn is still pending.
    pub async fn send_turn(&self, text: &str) -> Result<TurnOutcome> {
        let conversation_id = {
            let mut state = self.state.write().await;
            if state.phase != ChatPhase::Open {
                return Ok(TurnOutcome::Rejected);
            }
            if matches!(
                state.turn,
                Some(TurnState {
                    phase: TurnPhase::Pending,
                    ..
                })
            ) {
                return Ok(TurnOutcome::Rejected);
            }

            let Some(conversation_id) = self.context.conversation_id().await else {
                return Err(LumenError::internal("open conversation without an id"));
            };

            let id = next_message_id(&state.messages);
            state.messages.push(ChatMessage::user(id.clone(), text));
            state.turn = Some(TurnState {
                message_id: id,
                phase: TurnPhase::Pending,
            });
            self.updates.send_replace(state.clone());
            conversation_id
        };

        let outcome = self
            .client
            .send_turn(self.context.identity(), text, &conversation_id)
            .await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(reply) => {
                if let Some(content) = reply.last_assistant_content() {
                    let id = next_message_id(&state.messages);
                    state.messages.push(ChatMessage::assistant(id, content));
                }
                if let Some(turn) = state.turn.as_mut() {
                    turn.phase = TurnPhase::Confirmed;
                }
                self.updates.send_replace(state.clone());
                Ok(TurnOutcome::Completed)
            }
            Err(e) => {
                if let Some(turn) = state.turn.as_mut() {
                    turn.phase = TurnPhase::Failed;
                }
                self.updates.send_replace(state.clone());
                tracing::warn!(error = %e, "deep dive turn failed");
                Err(e)
            }
        }
    }

    /// Closes the deep dive.
    ///
    /// Notifies the backend best-effort (a failure is logged and ignored,
    /// never blocking teardown), then unconditionally clears the conversation
    /// id, the message history, and the turn state.
    pub async fn close(&self) {
        if let Some(conversation_id) = self.context.conversation_id().await {
            if let Err(e) = self
                .client
                .end_deep_dive(self.context.identity(), &conversation_id)
                .await
            {
                tracing::warn!(error = %e, "failed to end deep dive remotely");
            }
        }

        self.context.clear_conversation().await;
        let mut state = self.state.write().await;
        state.phase = ChatPhase::Closed;
        state.messages.clear();
        state.turn = None;
        self.updates.send_replace(state.clone());
        tracing::info!("deep dive closed");
    }

    /// Returns the current state.
    pub async fn snapshot(&self) -> ChatSnapshot {
        self.state.read().await.clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.updates.subscribe()
    }
}

/// Next id in the conversation's monotonic message sequence.
fn next_message_id(messages: &[ChatMessage]) -> String {
    (messages.len() + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use lumen_core::api::{ConversationTurn, DeepDiveHandle, QueryReply, RemoteError, TurnReply};
    use lumen_core::identity::Identity;
    use lumen_core::session::MessageRole;

    #[derive(Default)]
    struct MockClient {
        init_results: Mutex<VecDeque<Result<DeepDiveHandle>>>,
        turn_results: Mutex<VecDeque<(Duration, Result<TurnReply>)>>,
        end_results: Mutex<VecDeque<Result<()>>>,
        init_calls: AtomicUsize,
        turn_calls: AtomicUsize,
        end_calls: AtomicUsize,
    }

    impl MockClient {
        fn with_init(self, result: Result<DeepDiveHandle>) -> Self {
            self.init_results.lock().unwrap().push_back(result);
            self
        }

        fn with_turn(self, delay: Duration, result: Result<TurnReply>) -> Self {
            self.turn_results.lock().unwrap().push_back((delay, result));
            self
        }

        fn with_end(self, result: Result<()>) -> Self {
            self.end_results.lock().unwrap().push_back(result);
            self
        }
    }

    #[async_trait::async_trait]
    impl ApiClient for MockClient {
        async fn submit_query(&self, _identity: &Identity, _question: &str) -> Result<QueryReply> {
            panic!("unexpected submit_query call");
        }

        async fn init_deep_dive(
            &self,
            _identity: &Identity,
            _last_question: &str,
            _last_answer: &str,
        ) -> Result<DeepDiveHandle> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            self.init_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted init_deep_dive call")
        }

        async fn send_turn(
            &self,
            _identity: &Identity,
            _question: &str,
            _conversation_id: &str,
        ) -> Result<TurnReply> {
            self.turn_calls.fetch_add(1, Ordering::SeqCst);
            let (delay, outcome) = self
                .turn_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted send_turn call");
            tokio::time::sleep(delay).await;
            outcome
        }

        async fn end_deep_dive(&self, _identity: &Identity, _conversation_id: &str) -> Result<()> {
            self.end_calls.fetch_add(1, Ordering::SeqCst);
            self.end_results
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted end_deep_dive call")
        }
    }

    fn handle() -> DeepDiveHandle {
        DeepDiveHandle {
            conversation_id: "conv-1".to_string(),
        }
    }

    fn assistant_reply(content: &str) -> TurnReply {
        TurnReply {
            turns: vec![ConversationTurn {
                role: MessageRole::Assistant,
                content: content.to_string(),
            }],
            reasoning: None,
            documents: None,
        }
    }

    async fn context_with_qa() -> Arc<SessionContext> {
        let context = Arc::new(SessionContext::new(Identity::new("user-1", "session-1")));
        context
            .set_last_qa("What is Q4 churn?".to_string(), "Churn is 4%.".to_string())
            .await;
        context
    }

    #[tokio::test]
    async fn test_open_without_query_is_rejected_without_remote_call() {
        let client = Arc::new(MockClient::default());
        let context = Arc::new(SessionContext::new(Identity::new("user-1", "session-1")));
        let manager = ConversationManager::new(client.clone(), context.clone());

        let err = manager.open().await.unwrap_err();
        assert!(err.is_precondition());
        assert_eq!(client.init_calls.load(Ordering::SeqCst), 0);

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.phase, ChatPhase::Closed);
        assert!(snapshot.messages.is_empty());
        assert!(context.conversation_id().await.is_none());
    }

    #[tokio::test]
    async fn test_open_seeds_question_and_insight() {
        let client = Arc::new(MockClient::default().with_init(Ok(handle())));
        let context = context_with_qa().await;
        let manager = ConversationManager::new(client, context.clone());

        manager.open().await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.phase, ChatPhase::Open);
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[0].id, "1");
        assert_eq!(snapshot.messages[0].role, MessageRole::User);
        assert_eq!(snapshot.messages[0].content, "What is Q4 churn?");
        assert_eq!(snapshot.messages[1].id, "2");
        assert_eq!(snapshot.messages[1].role, MessageRole::Assistant);
        assert_eq!(snapshot.messages[1].content, "Churn is 4%.");
        assert_eq!(context.conversation_id().await, Some("conv-1".to_string()));
    }

    #[tokio::test]
    async fn test_failed_init_returns_to_closed() {
        let client = Arc::new(
            MockClient::default()
                .with_init(Err(LumenError::Remote(RemoteError::status(500, None)))),
        );
        let context = context_with_qa().await;
        let manager = ConversationManager::new(client, context.clone());

        let err = manager.open().await.unwrap_err();
        assert!(err.is_remote());

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.phase, ChatPhase::Closed);
        assert!(snapshot.messages.is_empty());
        assert!(context.conversation_id().await.is_none());
    }

    #[tokio::test]
    async fn test_turn_round_trip_appends_both_messages() {
        let client = Arc::new(
            MockClient::default()
                .with_init(Ok(handle()))
                .with_turn(Duration::ZERO, Ok(assistant_reply("Because of seasonality."))),
        );
        let manager = ConversationManager::new(client, context_with_qa().await);
        manager.open().await.unwrap();

        let outcome = manager.send_turn("Why did it rise?").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.messages.len(), 4);
        assert_eq!(snapshot.messages[2].role, MessageRole::User);
        assert_eq!(snapshot.messages[2].content, "Why did it rise?");
        assert_eq!(snapshot.messages[3].role, MessageRole::Assistant);
        assert_eq!(snapshot.messages[3].content, "Because of seasonality.");
        assert_eq!(
            snapshot.turn,
            Some(TurnState {
                message_id: "3".to_string(),
                phase: TurnPhase::Confirmed,
            })
        );
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_optimistic_user_message() {
        let client = Arc::new(
            MockClient::default()
                .with_init(Ok(handle()))
                .with_turn(
                    Duration::ZERO,
                    Err(LumenError::Remote(RemoteError::status(503, None))),
                )
                .with_turn(Duration::ZERO, Ok(assistant_reply("Recovered."))),
        );
        let manager = ConversationManager::new(client, context_with_qa().await);
        manager.open().await.unwrap();

        let err = manager.send_turn("Why did it rise?").await.unwrap_err();
        assert!(err.is_remote());

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.phase, ChatPhase::Open);
        assert_eq!(snapshot.messages.len(), 3);
        assert_eq!(snapshot.messages[2].role, MessageRole::User);
        assert_eq!(
            snapshot.turn.as_ref().map(|t| t.phase),
            Some(TurnPhase::Failed)
        );

        // A fresh user-initiated turn is accepted after the failure.
        let outcome = manager.send_turn("And now?").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Completed);
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.messages.len(), 5);
        assert_eq!(snapshot.messages[4].content, "Recovered.");
    }

    #[tokio::test]
    async fn test_second_turn_while_pending_is_rejected() {
        let client = Arc::new(
            MockClient::default()
                .with_init(Ok(handle()))
                .with_turn(Duration::from_millis(50), Ok(assistant_reply("Slow answer."))),
        );
        let manager = Arc::new(ConversationManager::new(
            client.clone(),
            context_with_qa().await,
        ));
        manager.open().await.unwrap();

        let pending = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.send_turn("slow question").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let outcome = manager.send_turn("impatient question").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Rejected);
        assert_eq!(client.turn_calls.load(Ordering::SeqCst), 1);

        assert_eq!(pending.await.unwrap().unwrap(), TurnOutcome::Completed);
        let snapshot = manager.snapshot().await;
        // Only the accepted turn's messages exist.
        assert_eq!(snapshot.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_turn_outside_open_conversation_is_rejected() {
        let client = Arc::new(MockClient::default());
        let manager = ConversationManager::new(client.clone(), context_with_qa().await);

        let outcome = manager.send_turn("hello?").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Rejected);
        assert_eq!(client.turn_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_close_tears_down_even_when_end_fails() {
        let client = Arc::new(
            MockClient::default()
                .with_init(Ok(handle()))
                .with_end(Err(LumenError::Remote(RemoteError::Network(
                    "connection reset".to_string(),
                )))),
        );
        let context = context_with_qa().await;
        let manager = ConversationManager::new(client.clone(), context.clone());
        manager.open().await.unwrap();

        manager.close().await;

        assert_eq!(client.end_calls.load(Ordering::SeqCst), 1);
        assert!(context.conversation_id().await.is_none());
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.phase, ChatPhase::Closed);
        assert!(snapshot.messages.is_empty());
        assert!(snapshot.turn.is_none());
    }

    #[tokio::test]
    async fn test_reopen_after_close_reseeds() {
        let client = Arc::new(
            MockClient::default()
                .with_init(Ok(handle()))
                .with_end(Ok(()))
                .with_init(Ok(DeepDiveHandle {
                    conversation_id: "conv-2".to_string(),
                })),
        );
        let context = context_with_qa().await;
        let manager = ConversationManager::new(client, context.clone());

        manager.open().await.unwrap();
        manager.close().await;
        manager.open().await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.phase, ChatPhase::Open);
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(context.conversation_id().await, Some("conv-2".to_string()));
    }
}
