//! ConfigChat gateway: the exchange pipeline, its HTTP API and the CLI.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod runtime;
pub mod state;
