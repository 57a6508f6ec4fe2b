//! Query result domain models.

use serde::{Deserialize, Serialize};

/// A supporting document attached to a query result.
///
/// `id` is unique within one result's document sequence; the sequence order is
/// the display order (relevance ranking is applied upstream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    pub description: String,
    pub url: String,
}

/// The answer produced by one successful query.
///
/// Produced exactly once per query and immutable afterwards; a new query
/// creates a new `QueryResult`, it never mutates the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The reasoning trace shown before the answer.
    pub reasoning: String,
    /// The answer text ("insight").
    pub insight: String,
    /// Confidence score, 0-100.
    pub confidence: u8,
    /// Supporting documents in display order.
    pub documents: Vec<Document>,
}
