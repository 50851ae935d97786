//! Shared types for the ConfigChat crates: errors, configuration,
//! conversation messages, identities and structured trace events.

pub mod config;
pub mod error;
pub mod identity;
pub mod message;
pub mod trace;
pub mod usage;
