use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use url::Url;

use super::CatalogState;
use crate::client::{ApiError, ApiRequest};
use crate::http::{error_response, ErrorKind};
use crate::imagegen::ImageGenError;

/// Cap for each reference image (10 MiB).
pub const IMAGE_LIMIT: usize = 10 * 1024 * 1024;
/// Cap for the whole form: two images plus the prompt and framing.
pub const FORM_LIMIT: usize = 2 * IMAGE_LIMIT + 1024 * 1024;

const IMAGE_FIELDS: [&str; 2] = ["image1", "image2"];

pub async fn handler(
    State(state): State<CatalogState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, GenerateError> {
    let mut multipart = multipart.map_err(|e| GenerateError::Multipart(e.body_text()))?;

    let mut prompt = String::new();
    let mut images: Vec<Bytes> = Vec::with_capacity(IMAGE_FIELDS.len());

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(GenerateError::from_multipart)?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "prompt" {
            prompt = field.text().await.map_err(GenerateError::from_multipart)?;
        } else if IMAGE_FIELDS.contains(&name.as_str()) {
            let data = field.bytes().await.map_err(GenerateError::from_multipart)?;
            if data.len() > IMAGE_LIMIT {
                return Err(GenerateError::ImageTooLarge(name));
            }
            if !data.is_empty() {
                images.push(data);
            }
        }
    }

    if prompt.trim().is_empty() {
        return Err(GenerateError::MissingPrompt);
    }

    let client = state.imagegen().ok_or(GenerateError::NotConfigured)?;
    tracing::info!(images = images.len(), endpoint = %client.endpoint(), "forwarding generation request");

    let deadline = match state.upstream_deadline() {
        Some(deadline) => deadline.min(client.timeout()),
        None => client.timeout(),
    };
    let response = tokio::time::timeout(deadline, client.generate(&prompt, &images))
        .await
        .map_err(|_| ImageGenError::TimedOut(deadline))??;
    Ok(Json(response))
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to parse form: {0}")]
    Multipart(String),
    #[error("prompt is required")]
    MissingPrompt,
    #[error("{0} exceeds the 10 MiB limit")]
    ImageTooLarge(String),
    #[error("image generation is not configured")]
    NotConfigured,
    #[error("generation failed: {0}")]
    Upstream(#[from] ImageGenError),
}

impl GenerateError {
    fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            GenerateError::ImageTooLarge("form".to_string())
        } else {
            GenerateError::Multipart(err.body_text())
        }
    }
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        match self {
            GenerateError::Multipart(_) | GenerateError::MissingPrompt => {
                error_response(StatusCode::BAD_REQUEST, ErrorKind::Validation, self.to_string())
            }
            GenerateError::ImageTooLarge(_) => error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorKind::PayloadTooLarge,
                self.to_string(),
            ),
            GenerateError::NotConfigured => error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Upstream,
                self.to_string(),
            ),
            GenerateError::Upstream(ref e) => {
                tracing::error!("image generation failed: {}", e);
                error_response(StatusCode::BAD_GATEWAY, ErrorKind::Upstream, self.to_string())
            }
        }
    }
}

/// Client side of `POST /imagegen/generate`.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    /// (file name, contents); at most two are sent.
    pub images: Vec<(String, Vec<u8>)>,
}

impl ApiRequest for GenerateRequest {
    type Response = serde_json::Value;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/imagegen/generate")?;
        let mut form = Form::new().text("prompt", self.prompt);
        for (field, (filename, data)) in IMAGE_FIELDS.iter().zip(self.images) {
            form = form.part(*field, Part::bytes(data).file_name(filename));
        }
        Ok(client.post(full_url).multipart(form))
    }
}
