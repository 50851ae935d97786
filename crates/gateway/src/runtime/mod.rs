//! Core runtime: one chat exchange from identity resolution to judge.
//!
//! Entry point: [`run_exchange`] takes a session id and a user message and
//! returns the assistant's answer, or a reason no answer was produced.

pub mod invoke;
pub mod judge;
pub mod session_lock;

use cc_aiconfig::AiConfig;
use cc_domain::trace::TraceEvent;
use cc_sessions::resolve_identity;

use crate::state::AppState;

pub use judge::JudgeOutcome;

/// Model name reported when no enabled config is available.
pub const UNKNOWN_MODEL: &str = "Unknown";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Exchange parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Input to a single exchange.
#[derive(Debug, Clone)]
pub struct ExchangeInput {
    pub session_id: String,
    pub message: String,
    /// Caller-supplied identity key; `user-<session>` when absent.
    pub user_id: Option<String>,
    pub email: Option<String>,
}

/// A completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResult {
    pub assistant_text: String,
    pub model_id: String,
    pub duration_ms: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// `None` when no judge is configured or its config is disabled.
    pub judge: Option<JudgeOutcome>,
}

impl ExchangeResult {
    pub fn judge_available(&self) -> bool {
        self.judge.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    Completed(ExchangeResult),
    /// The chat config is disabled for this identity. Nothing was sent to
    /// the model and history is unchanged.
    Disabled { key: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("inference failed: {0}")]
    Inference(#[source] cc_domain::error::Error),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Exchange
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one chat exchange.
///
/// The session lock is held from the history read until the new turns are
/// appended, so concurrent messages to one session apply in order. History
/// only changes when the model call succeeds.
pub async fn run_exchange(
    state: &AppState,
    input: ExchangeInput,
) -> Result<ExchangeOutcome, ExchangeError> {
    let _permit = state.session_locks.acquire(&input.session_id).await;

    let identity = resolve_identity(
        input.user_id.as_deref(),
        input.email.as_deref(),
        &input.session_id,
    );

    let chat_key = state.config.aiconfig.chat_config_key.as_str();
    let fetched = state
        .aiconfig
        .config(chat_key, &identity, AiConfig::disabled())
        .await;

    if !fetched.config.enabled {
        TraceEvent::AiConfigDisabled {
            config_key: chat_key.to_owned(),
            context_key: identity.key.clone(),
        }
        .emit();
        return Ok(ExchangeOutcome::Disabled {
            key: chat_key.to_owned(),
        });
    }

    let history = state.sessions.snapshot(&input.session_id);

    let invocation = invoke::invoke(
        state.llm.as_ref(),
        &fetched.config,
        &history,
        &input.message,
        fetched.tracker.as_ref(),
    )
    .await
    .map_err(|e| {
        tracing::error!(
            session_id = %input.session_id,
            config_key = %chat_key,
            error = %e,
            "chat inference failed"
        );
        ExchangeError::Inference(e)
    })?;

    state
        .sessions
        .append_exchange(&input.session_id, &input.message, &invocation.text);
    state.sessions.record_usage(
        &input.session_id,
        invocation.usage.input_tokens,
        invocation.usage.output_tokens,
    );

    let judge = match state.config.aiconfig.judge_config_key.as_deref() {
        Some(judge_key) => {
            judge::evaluate(state, judge_key, &identity, &input.message, &invocation.text).await
        }
        None => None,
    };

    Ok(ExchangeOutcome::Completed(ExchangeResult {
        model_id: fetched
            .config
            .model_name()
            .unwrap_or(UNKNOWN_MODEL)
            .to_owned(),
        assistant_text: invocation.text,
        duration_ms: invocation.duration_ms,
        input_tokens: invocation.usage.input_tokens,
        output_tokens: invocation.usage.output_tokens,
        judge,
    }))
}

/// Name of the model the chat config selects for this session, or
/// [`UNKNOWN_MODEL`] when the config is disabled or unavailable.
pub async fn model_info(state: &AppState, session_id: &str, user_id: Option<&str>) -> String {
    let identity = resolve_identity(user_id, None, session_id);
    let fetched = state
        .aiconfig
        .config(
            &state.config.aiconfig.chat_config_key,
            &identity,
            AiConfig::disabled(),
        )
        .await;

    if !fetched.config.enabled {
        return UNKNOWN_MODEL.to_owned();
    }
    fetched
        .config
        .model_name()
        .unwrap_or(UNKNOWN_MODEL)
        .to_owned()
}
