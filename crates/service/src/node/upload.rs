use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use url::Url;

use common::prelude::{ContentStoreError, UploadResponse};

use super::NodeState;
use crate::client::{ApiError, ApiRequest};
use crate::http::{error_response, ErrorKind};

/// Multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

pub async fn handler(
    State(state): State<NodeState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::Multipart(e.body_text()))?;
    let limit = state.max_file_size();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::from_multipart(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadError::from_multipart(e, limit))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or(UploadError::MissingFile)?;
    if data.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    if data.len() > limit {
        return Err(UploadError::TooLarge(limit));
    }

    let fingerprint = state.store().store(&data).await?;
    tracing::info!(
        filename = %filename,
        %fingerprint,
        size = data.len(),
        "stored file"
    );

    Ok((
        StatusCode::OK,
        Json(UploadResponse {
            success: true,
            fingerprint,
            message: "File Upload Successful".to_string(),
            size: data.len() as u64,
        }),
    ))
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to parse form: {0}")]
    Multipart(String),
    #[error("file not found in form")]
    MissingFile,
    #[error("file is empty")]
    EmptyFile,
    #[error("file exceeds the {0} byte limit")]
    TooLarge(usize),
    #[error("failed to store file: {0}")]
    Store(#[from] ContentStoreError),
}

impl UploadError {
    fn from_multipart(err: MultipartError, limit: usize) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge(limit)
        } else {
            UploadError::Multipart(err.body_text())
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::Multipart(_) | UploadError::MissingFile | UploadError::EmptyFile => {
                error_response(StatusCode::BAD_REQUEST, ErrorKind::Validation, self.to_string())
            }
            UploadError::TooLarge(_) => error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorKind::PayloadTooLarge,
                self.to_string(),
            ),
            UploadError::Store(e) => {
                tracing::error!("upload failed: {}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorKind::IoFailure,
                    "failed to store file",
                )
            }
        }
    }
}

/// Client side of `POST /upload`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub filename: String,
    pub data: Vec<u8>,
}

impl ApiRequest for UploadRequest {
    type Response = UploadResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/upload")?;
        let part = Part::bytes(self.data).file_name(self.filename);
        let form = Form::new().part(FILE_FIELD, part);
        Ok(client.post(full_url).multipart(form))
    }
}
