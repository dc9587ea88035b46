use axum::Json;
use axum::response::IntoResponse;

/// Liveness probe
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}
