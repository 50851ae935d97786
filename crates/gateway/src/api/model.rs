use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::api::{non_blank, DEFAULT_SESSION_ID};
use crate::runtime::model_info;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ModelQuery {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// `GET /api/model`: the model the chat config selects for this caller.
pub async fn model(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> impl IntoResponse {
    let session_id =
        non_blank(query.session_id).unwrap_or_else(|| DEFAULT_SESSION_ID.to_owned());
    let user_id = non_blank(query.user_id);

    let model = model_info(&state, &session_id, user_id.as_deref()).await;

    Json(serde_json::json!({
        "model": model,
        "session_id": session_id,
    }))
}
