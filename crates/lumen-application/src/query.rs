//! Query life-cycle orchestration.
//!
//! Drives a single query through `Idle → Submitting → (Success | Failed)` and
//! schedules the staged reveal of the result sections. A new submission while
//! one is in flight restarts the machine; the older call keeps running but
//! its outcome is discarded when it resolves (last-submission-wins, no
//! cancellation signal).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};

use lumen_core::api::ApiClient;
use lumen_core::error::Result;
use lumen_core::query::QueryResult;
use lumen_core::session::SessionContext;

/// Confidence score used when the backend omits one.
const DEFAULT_CONFIDENCE: u8 = 85;

/// Delays between the reveal steps after a successful query.
///
/// The defaults stagger insight, documents, and the deep-dive entry point at
/// 300/600/900 ms after the answer arrives. The values are a presentation
/// cue; the reveal *order* is a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSchedule {
    pub insight: Duration,
    pub documents: Duration,
    pub deep_dive: Duration,
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self {
            insight: Duration::from_millis(300),
            documents: Duration::from_millis(600),
            deep_dive: Duration::from_millis(900),
        }
    }
}

/// Visibility flags of the result sections.
///
/// Monotonic within one result's lifetime: a set flag only reverts when a new
/// submission resets the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevealFlags {
    pub reasoning: bool,
    pub insight: bool,
    pub documents: bool,
    pub deep_dive: bool,
}

/// Reveal steps in contract order.
#[derive(Debug, Clone, Copy)]
enum RevealStage {
    Insight,
    Documents,
    DeepDive,
}

impl RevealFlags {
    /// Sets the flag of `stage` together with every earlier flag, so the
    /// reasoning → insight → documents → deep-dive order holds under any
    /// timer schedule.
    fn apply(&mut self, stage: RevealStage) {
        match stage {
            RevealStage::Insight => {
                self.insight = true;
            }
            RevealStage::Documents => {
                self.insight = true;
                self.documents = true;
            }
            RevealStage::DeepDive => {
                self.insight = true;
                self.documents = true;
                self.deep_dive = true;
            }
        }
    }
}

/// Phase of the query life cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryPhase {
    #[default]
    Idle,
    Submitting,
    Success,
    Failed,
}

/// Observable state of the query machine, published on every change.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub phase: QueryPhase,
    /// The text of the current (latest) submission.
    pub question: String,
    /// True from submission until an outcome arrives.
    pub thinking: bool,
    /// The current result; replaced wholesale by the next successful query.
    pub result: Option<QueryResult>,
    /// Human-readable error of a failed submission.
    pub error: Option<String>,
    pub reveal: RevealFlags,
    /// Monotonic submission sequence; stale outcomes compare against it.
    pub submission: u64,
}

/// Drives the query life cycle against the remote backend.
///
/// All state lives behind one lock and is additionally broadcast as
/// [`QuerySnapshot`] values over a watch channel, so a presentation layer can
/// either poll [`snapshot`](Self::snapshot) or subscribe.
pub struct QueryOrchestrator {
    client: Arc<dyn ApiClient>,
    context: Arc<SessionContext>,
    state: Arc<RwLock<QuerySnapshot>>,
    updates: watch::Sender<QuerySnapshot>,
    schedule: RevealSchedule,
}

impl QueryOrchestrator {
    /// Creates an orchestrator with the default reveal schedule.
    pub fn new(client: Arc<dyn ApiClient>, context: Arc<SessionContext>) -> Self {
        Self::with_schedule(client, context, RevealSchedule::default())
    }

    /// Creates an orchestrator with an explicit reveal schedule.
    pub fn with_schedule(
        client: Arc<dyn ApiClient>,
        context: Arc<SessionContext>,
        schedule: RevealSchedule,
    ) -> Self {
        let (updates, _) = watch::channel(QuerySnapshot::default());
        Self {
            client,
            context,
            state: Arc::new(RwLock::new(QuerySnapshot::default())),
            updates,
            schedule,
        }
    }

    /// Submits a query and drives it to an outcome.
    ///
    /// Restarts the machine: the previous result and error are cleared, the
    /// reasoning section becomes visible immediately (so a collaborator can
    /// render a "thinking" placeholder), and any in-flight submission is
    /// superseded.
    ///
    /// # Errors
    ///
    /// Returns the remote failure verbatim; the same text is stored in the
    /// snapshot's `error` field. A superseded submission returns `Ok(())`
    /// since its outcome is discarded.
    pub async fn submit(&self, question: &str) -> Result<()> {
        let submission = {
            let mut state = self.state.write().await;
            state.submission += 1;
            state.phase = QueryPhase::Submitting;
            state.question = question.to_string();
            state.thinking = true;
            state.result = None;
            state.error = None;
            state.reveal = RevealFlags {
                reasoning: true,
                ..RevealFlags::default()
            };
            self.updates.send_replace(state.clone());
            state.submission
        };

        tracing::info!(submission, "submitting query");
        let outcome = self.client.submit_query(self.context.identity(), question).await;

        let mut state = self.state.write().await;
        if state.submission != submission {
            // A newer submission restarted the machine while this call was in
            // flight; its outcome is discarded.
            tracing::debug!(submission, "discarding outcome of superseded submission");
            return Ok(());
        }

        match outcome {
            Ok(reply) => {
                let result = QueryResult {
                    reasoning: reply.reasoning,
                    insight: reply.answer_text,
                    confidence: reply.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                    documents: reply.documents,
                };
                self.context
                    .set_last_qa(question.to_string(), result.insight.clone())
                    .await;

                state.phase = QueryPhase::Success;
                state.thinking = false;
                state.result = Some(result);
                self.updates.send_replace(state.clone());
                drop(state);

                self.schedule_reveals(submission);
                tracing::info!(submission, "query succeeded");
                Ok(())
            }
            Err(e) => {
                state.phase = QueryPhase::Failed;
                state.thinking = false;
                state.error = Some(e.to_string());
                self.updates.send_replace(state.clone());
                tracing::warn!(submission, error = %e, "query failed");
                Err(e)
            }
        }
    }

    /// Spawns the delayed reveal steps for a successful submission.
    ///
    /// Each step re-checks that its submission is still current before
    /// touching the flags, so reveals of a superseded result never land.
    fn schedule_reveals(&self, submission: u64) {
        let steps = [
            (self.schedule.insight, RevealStage::Insight),
            (self.schedule.documents, RevealStage::Documents),
            (self.schedule.deep_dive, RevealStage::DeepDive),
        ];

        for (delay, stage) in steps {
            let state = Arc::clone(&self.state);
            let updates = self.updates.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let mut state = state.write().await;
                if state.submission != submission {
                    return;
                }
                state.reveal.apply(stage);
                updates.send_replace(state.clone());
            });
        }
    }

    /// Returns the current state.
    pub async fn snapshot(&self) -> QuerySnapshot {
        self.state.read().await.clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot> {
        self.updates.subscribe()
    }
}
