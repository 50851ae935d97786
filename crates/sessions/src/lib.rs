//! Session management for ConfigChat.
//!
//! Resolves the per-request identity an AI config is evaluated against and
//! keeps each session's conversation history in memory for the lifetime of
//! the process.

pub mod identity;
pub mod store;

pub use identity::resolve_identity;
pub use store::{ConversationStore, SessionRecord};
