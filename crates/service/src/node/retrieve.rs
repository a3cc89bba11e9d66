use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{ContentStoreError, Fingerprint, ValidationError};

use super::NodeState;
use crate::client::{ApiError, ApiRequest};
use crate::http::{error_response, ErrorKind};

// Content under a fingerprint never changes.
const IMMUTABLE: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    #[serde(default, alias = "hash")]
    pub fingerprint: String,
}

pub async fn handler(
    State(state): State<NodeState>,
    Query(req): Query<RetrieveRequest>,
) -> Result<Response, RetrieveError> {
    let fingerprint: Fingerprint = req.fingerprint.parse()?;
    let data = state.store().retrieve(&fingerprint).await?;

    tracing::info!(%fingerprint, size = data.len(), "retrieved file");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, data.len().to_string()),
            (header::CACHE_CONTROL, IMMUTABLE.to_string()),
        ],
        data,
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] ContentStoreError),
}

impl IntoResponse for RetrieveError {
    fn into_response(self) -> Response {
        match self {
            RetrieveError::Validation(e) => {
                error_response(StatusCode::BAD_REQUEST, ErrorKind::Validation, e.to_string())
            }
            RetrieveError::Store(ContentStoreError::NotFound(_)) => {
                error_response(StatusCode::NOT_FOUND, ErrorKind::NotFound, "file not found")
            }
            RetrieveError::Store(e) => {
                tracing::error!("retrieve failed: {}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::IoFailure,
                    "failed to read file",
                )
            }
        }
    }
}

impl ApiRequest for RetrieveRequest {
    type Response = Bytes;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/retrieve")?;
        Ok(client.get(full_url).query(&self))
    }
}
