use axum::response::{IntoResponse, Json};

/// `GET /api/health`. Always public.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "configchat",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
