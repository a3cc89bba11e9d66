use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::prelude::{FileRecord, RegisterResponse, ValidationError};

use super::CatalogState;
use crate::client::{ApiError, ApiRequest};
use crate::http::{error_response, ErrorKind};

pub async fn handler(
    State(state): State<CatalogState>,
    record: Result<Json<FileRecord>, JsonRejection>,
) -> Result<impl IntoResponse, RegisterError> {
    let Json(record) = record.map_err(|e| RegisterError::InvalidBody(e.body_text()))?;
    let name = record.name.clone();
    let replicas = record.replicas.len();

    let fingerprint = state.catalog().register_file(record)?;
    tracing::info!(%fingerprint, name = %name, replicas, "registered file");

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            message: "File registered successfully".to_string(),
            fingerprint,
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, ErrorKind::Validation, self.to_string())
    }
}

/// Client side of `POST /register`.
#[derive(Debug, Clone)]
pub struct RegisterRequest(pub FileRecord);

impl ApiRequest for RegisterRequest {
    type Response = RegisterResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/register")?;
        Ok(client.post(full_url).json(&self.0))
    }
}
