//! Conversation history endpoints.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::api::{error_response, non_blank, DEFAULT_SESSION_ID};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/history
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Ordered turns of a session. Unknown sessions have an empty history.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let session_id =
        non_blank(query.session_id).unwrap_or_else(|| DEFAULT_SESSION_ID.to_owned());
    let history = state.sessions.snapshot(&session_id);

    Json(serde_json::json!({
        "history": history,
        "session_id": session_id,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/reset
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Clear a session's history. Idempotent: resetting an unknown or empty
/// session succeeds too.
///
/// An empty body targets the default session. A body that is not a JSON
/// object is rejected rather than falling back to the default.
pub async fn reset(State(state): State<AppState>, body: Bytes) -> Response {
    let query = if body.iter().all(u8::is_ascii_whitespace) {
        SessionQuery::default()
    } else {
        match serde_json::from_slice::<SessionQuery>(&body) {
            Ok(query) => query,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request body: {e}"),
                )
            }
        }
    };
    let session_id =
        non_blank(query.session_id).unwrap_or_else(|| DEFAULT_SESSION_ID.to_owned());

    // Wait out any exchange in flight so it cannot re-append after the reset.
    let _permit = state.session_locks.acquire(&session_id).await;
    let existed = state.sessions.reset(&session_id);

    let message = if existed {
        "Conversation reset successfully"
    } else {
        "No conversation to reset"
    };

    Json(serde_json::json!({
        "message": message,
        "session_id": session_id,
        "existed": existed,
    }))
    .into_response()
}
