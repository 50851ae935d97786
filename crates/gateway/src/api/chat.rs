//! `POST /api/chat`: run one exchange and return the assistant's answer.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use crate::api::{error_response, non_blank};
use crate::runtime::{run_exchange, ExchangeError, ExchangeInput, ExchangeOutcome, JudgeOutcome};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / response shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// A fresh UUID is assigned when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub model: String,
    pub judge_available: bool,
    pub judge: Option<JudgeBody>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JudgeBody {
    Evaluated {
        evaluation: String,
        accuracy_score: Option<f64>,
        usage: UsageBody,
    },
    Failed {
        error: String,
    },
}

/// Token usage in the inference service's own field names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBody {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl From<JudgeOutcome> for JudgeBody {
    fn from(outcome: JudgeOutcome) -> Self {
        match outcome {
            JudgeOutcome::Evaluated {
                evaluation,
                score,
                usage,
            } => JudgeBody::Evaluated {
                evaluation,
                accuracy_score: score,
                usage: UsageBody {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                    total_tokens: usage.total(),
                },
            },
            JudgeOutcome::Failed { .. } => JudgeBody::Failed {
                error: "Judge evaluation failed".into(),
            },
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(State(state): State<AppState>, Json(body): Json<ChatRequest>) -> Response {
    if body.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message is required");
    }

    let session_id =
        non_blank(body.session_id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let input = ExchangeInput {
        session_id: session_id.clone(),
        message: body.message,
        user_id: non_blank(body.user_id),
        email: non_blank(body.email),
    };

    match run_exchange(&state, input).await {
        Ok(ExchangeOutcome::Completed(result)) => Json(ChatResponse {
            judge_available: result.judge_available(),
            response: result.assistant_text,
            session_id,
            model: result.model_id,
            judge: result.judge.map(JudgeBody::from),
        })
        .into_response(),
        Ok(ExchangeOutcome::Disabled { key }) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("AI configuration '{key}' is disabled for this context"),
        ),
        Err(e @ ExchangeError::Inference(_)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
