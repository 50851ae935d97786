use serde::Serialize;

/// Structured trace events emitted across all ConfigChat crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    AiConfigFetched {
        config_key: String,
        context_key: String,
        enabled: bool,
        model: Option<String>,
        variation_key: Option<String>,
        duration_ms: u64,
    },
    AiConfigDisabled {
        config_key: String,
        context_key: String,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        input_tokens: Option<u64>,
        output_tokens: Option<u64>,
        success: bool,
    },
    SessionCreated {
        session_id: String,
    },
    SessionReset {
        session_id: String,
        cleared_turns: usize,
    },
    HistoryTruncated {
        session_id: String,
        dropped_turns: usize,
    },
    JudgeScored {
        config_key: String,
        score: Option<f64>,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "cc_event");
    }
}
