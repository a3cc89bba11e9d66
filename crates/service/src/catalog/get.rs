use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{CatalogError, FileRecord};

use super::CatalogState;
use crate::client::{ApiError, ApiRequest};
use crate::http::{error_response, ErrorKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRequest {
    #[serde(default, alias = "hash")]
    pub fingerprint: String,
}

pub async fn handler(
    State(state): State<CatalogState>,
    Query(req): Query<GetRequest>,
) -> Result<Json<FileRecord>, GetError> {
    if req.fingerprint.is_empty() {
        return Err(GetError::MissingFingerprint);
    }
    Ok(Json(state.catalog().lookup_file(&req.fingerprint)?))
}

#[derive(Debug, thiserror::Error)]
pub enum GetError {
    #[error("fingerprint parameter is required")]
    MissingFingerprint,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl IntoResponse for GetError {
    fn into_response(self) -> Response {
        match self {
            GetError::MissingFingerprint => {
                error_response(StatusCode::BAD_REQUEST, ErrorKind::Validation, self.to_string())
            }
            GetError::Catalog(CatalogError::NotFound(_)) => {
                error_response(StatusCode::NOT_FOUND, ErrorKind::NotFound, self.to_string())
            }
        }
    }
}

impl ApiRequest for GetRequest {
    type Response = FileRecord;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/get")?;
        Ok(client.get(full_url).query(&self))
    }
}
