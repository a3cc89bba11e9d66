use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Failure class carried by every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    IoFailure,
    Upstream,
    PayloadTooLarge,
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

pub fn error_response(status: StatusCode, kind: ErrorKind, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        kind,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}
