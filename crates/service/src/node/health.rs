use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::NodeState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub port: String,
}

/// Liveness only; the content store is not consulted.
pub async fn handler(State(state): State<NodeState>) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-cache")],
        Json(HealthResponse {
            status: "healthy".to_string(),
            port: state.port().to_string(),
        }),
    )
        .into_response()
}
