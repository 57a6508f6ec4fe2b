//! Session domain module.
//!
//! This module contains the process-wide session context and the chat
//! message types shared by the query and deep-dive life cycles.
//!
//! # Module Structure
//!
//! - `context`: Process-wide shared state (`SessionContext`)
//! - `message`: Chat message types (`MessageRole`, `ChatMessage`)

mod context;
mod message;

// Re-export public API
pub use context::SessionContext;
pub use message::{ChatMessage, MessageRole};
