//! Wire DTOs for the insight backend and their mapping into reply types.
//!
//! The two query operations answer inside a `{ "data": ... }` envelope; the
//! deep-dive init operation answers bare. Mapping into the core reply types
//! is done by pure functions so it can be tested without a server.

use serde::{Deserialize, Serialize};

use lumen_core::api::{ConversationTurn, QueryReply, TurnReply};
use lumen_core::query::Document;
use lumen_core::session::MessageRole;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub user_id: &'a str,
    pub session_id: &'a str,
    pub user_question: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct InitRequest<'a> {
    pub user_id: &'a str,
    pub session_id: &'a str,
    pub last_question: &'a str,
    pub last_answer: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TurnRequest<'a> {
    pub user_id: &'a str,
    pub session_id: &'a str,
    pub user_question: &'a str,
    pub conversation_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct EndRequest<'a> {
    pub user_id: &'a str,
    pub session_id: &'a str,
    pub conversation_id: &'a str,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// `{ "data": ... }` wrapper used by `/query` and `/deep_dive/query`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireTurn {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponseBody {
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub conversation: Vec<WireTurn>,
    #[serde(default)]
    pub relevant_docs: Vec<WireDocument>,
    #[serde(default)]
    pub confidence: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InitResponseBody {
    pub conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TurnResponseBody {
    #[serde(default)]
    pub conversation: Vec<WireTurn>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub relevant_docs: Option<Vec<WireDocument>>,
}

/// Non-2xx responses may carry a human-readable `message`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Mapping into reply types
// ---------------------------------------------------------------------------

pub(crate) fn query_reply(body: QueryResponseBody) -> QueryReply {
    // The answer is the first assistant entry of the returned conversation.
    let answer_text = body
        .conversation
        .iter()
        .find(|turn| turn.role == "assistant")
        .map(|turn| turn.content.clone())
        .unwrap_or_default();

    QueryReply {
        reasoning: body.reasoning,
        answer_text,
        documents: documents(body.relevant_docs),
        confidence: body.confidence,
    }
}

pub(crate) fn turn_reply(body: TurnResponseBody) -> TurnReply {
    TurnReply {
        turns: body.conversation.into_iter().map(turn).collect(),
        reasoning: body.reasoning,
        documents: body.relevant_docs.map(documents),
    }
}

fn turn(wire: WireTurn) -> ConversationTurn {
    let role = match wire.role.as_str() {
        "assistant" => MessageRole::Assistant,
        _ => MessageRole::User,
    };
    ConversationTurn {
        role,
        content: wire.content,
    }
}

fn documents(docs: Vec<WireDocument>) -> Vec<Document> {
    docs.into_iter()
        .enumerate()
        .map(|(idx, doc)| Document {
            // Position fallback for backends that omit document ids.
            id: if doc.id.is_empty() {
                idx.to_string()
            } else {
                doc.id
            },
            file_name: doc.file_name,
            description: doc.description,
            url: doc.url,
        })
        .collect()
}
