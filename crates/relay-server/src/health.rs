use axum::response::IntoResponse;
use http::StatusCode;

/// Liveness probe; answers `200 ok` whenever the process is up
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
