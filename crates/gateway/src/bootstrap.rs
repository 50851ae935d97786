//! AppState construction shared by `serve`, `run` and `chat`.

use std::sync::Arc;

use anyhow::Context;
use sha2::{Digest, Sha256};

use cc_aiconfig::LaunchDarklyClient;
use cc_domain::config::{Config, ConfigSeverity};
use cc_providers::BedrockProvider;

use crate::state::AppState;

/// Validate config, build the remote clients and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── AI config client ─────────────────────────────────────────────
    let aiconfig = LaunchDarklyClient::from_settings(&config.aiconfig)
        .context("initializing AI config client")?;
    tracing::info!(
        base_url = %config.aiconfig.base_url,
        chat_config_key = %config.aiconfig.chat_config_key,
        judge_config_key = ?config.aiconfig.judge_config_key,
        "AI config client ready"
    );

    // ── Inference provider ───────────────────────────────────────────
    let llm = BedrockProvider::from_config(&config.bedrock)
        .context("initializing Bedrock provider")?;
    tracing::info!(
        endpoint = %config.bedrock.effective_endpoint(),
        "Bedrock provider ready"
    );

    let mut state = AppState::new(config.clone(), Arc::new(aiconfig), Arc::new(llm));
    tracing::info!(
        max_history_turns = config.sessions.max_history_turns,
        "conversation store ready"
    );

    // ── API token (read once, hash for constant-time comparison) ─────
    state.api_token_hash = api_token_hash(&config.server.api_token_env);
    if state.api_token_hash.is_none() {
        tracing::warn!(
            env_var = %config.server.api_token_env,
            "API token not set, /api endpoints are unauthenticated (dev mode)"
        );
    }

    Ok(state)
}

/// SHA-256 of the token held in `env_var`, or `None` when unset or blank.
pub fn api_token_hash(env_var: &str) -> Option<Vec<u8>> {
    std::env::var(env_var)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .map(|t| Sha256::digest(t.trim().as_bytes()).to_vec())
}
