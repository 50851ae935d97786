use std::sync::Arc;

use cc_aiconfig::AiConfigSource;
use cc_domain::config::Config;
use cc_providers::InferenceClient;
use cc_sessions::ConversationStore;

use crate::runtime::session_lock::SessionLockMap;

/// Shared application state passed to all API handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    /// Remote AI config evaluation.
    pub aiconfig: Arc<dyn AiConfigSource>,
    /// Hosted model endpoint.
    pub llm: Arc<dyn InferenceClient>,

    // ── Session management ────────────────────────────────────────────
    pub sessions: Arc<ConversationStore>,
    pub session_locks: Arc<SessionLockMap>,

    // ── Security (startup-computed) ───────────────────────────────────
    /// SHA-256 hash of the API bearer token (read once at startup).
    /// `None` = dev mode (no auth enforced).
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    /// Wire a state from already-built services. Auth is off.
    pub fn new(
        config: Arc<Config>,
        aiconfig: Arc<dyn AiConfigSource>,
        llm: Arc<dyn InferenceClient>,
    ) -> Self {
        let sessions = Arc::new(ConversationStore::new(config.sessions.max_history_turns));
        Self {
            config,
            aiconfig,
            llm,
            sessions,
            session_locks: Arc::new(SessionLockMap::new()),
            api_token_hash: None,
        }
    }
}
