//! Typed replies of the remote operations.

use serde::{Deserialize, Serialize};

use crate::query::Document;
use crate::session::MessageRole;

/// Reply of the query operation.
///
/// `answer_text` is the content of the first assistant entry of the wire
/// conversation (empty when the conversation carried none). `confidence`
/// passes the optional wire field through unchanged; defaulting it is caller
/// policy, not transport policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReply {
    pub reasoning: String,
    pub answer_text: String,
    pub documents: Vec<Document>,
    pub confidence: Option<u8>,
}

/// Reply of the deep-dive init operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepDiveHandle {
    pub conversation_id: String,
}

/// A single turn of a deep-dive conversation as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Reply of the deep-dive turn operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    pub turns: Vec<ConversationTurn>,
    pub reasoning: Option<String>,
    pub documents: Option<Vec<Document>>,
}

impl TurnReply {
    /// Returns the content of the last assistant turn, if any.
    ///
    /// This is the text the conversation layer appends as the assistant's
    /// answer to the turn that produced this reply.
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == MessageRole::Assistant)
            .map(|turn| turn.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_assistant_content() {
        let reply = TurnReply {
            turns: vec![
                ConversationTurn {
                    role: MessageRole::User,
                    content: "why?".to_string(),
                },
                ConversationTurn {
                    role: MessageRole::Assistant,
                    content: "first".to_string(),
                },
                ConversationTurn {
                    role: MessageRole::Assistant,
                    content: "second".to_string(),
                },
            ],
            reasoning: None,
            documents: None,
        };
        assert_eq!(reply.last_assistant_content(), Some("second"));
    }

    #[test]
    fn test_last_assistant_content_empty() {
        let reply = TurnReply {
            turns: vec![ConversationTurn {
                role: MessageRole::User,
                content: "why?".to_string(),
            }],
            reasoning: None,
            documents: None,
        };
        assert_eq!(reply.last_assistant_content(), None);
    }
}
